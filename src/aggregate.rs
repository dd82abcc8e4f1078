use std::collections::HashMap;
use std::hash::Hash;

use crate::interval::Span;

/// キーごとに集計した結果の1行。
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket<K> {
    pub key: K,
    pub seconds: f64,
    pub percent: f64,
}

/// 区間の長さをキーごとに合計する。
///
/// 結果はキーが最初に現れた順に並ぶ。キーは完全一致で比較し、空文字列も1つのキーとして扱う。
pub fn accumulate<K, I>(spans: I) -> Vec<(K, f64)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = (K, Span)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut totals: Vec<(K, f64)> = Vec::new();

    for (key, span) in spans {
        let position = *index.entry(key.clone()).or_insert_with(|| {
            totals.push((key, 0.0));
            totals.len() - 1
        });
        totals[position].1 += span.seconds();
    }

    totals
}

/// 区間の長さの合計を秒で返す。
///
/// 空の場合は`0.0`(負のゼロではない)となる。
pub fn total_seconds<I>(spans: I) -> f64
where
    I: IntoIterator<Item = Span>,
{
    spans
        .into_iter()
        .fold(0.0, |total, span| total + span.seconds())
}

/// `total`に対する`part`の割合を0から100で返す。
///
/// `total`が0の場合はNaNや無限大ではなく0を返す。
pub fn percent(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total * 100.0
    } else {
        0.0
    }
}

/// 全キーの合計を求めてから、各キーの割合を計算する。
///
/// 合計と`Bucket`のリストを返す。
pub fn with_percentages<K>(totals: Vec<(K, f64)>) -> (f64, Vec<Bucket<K>>) {
    let total = totals.iter().fold(0.0, |total, (_, seconds)| total + seconds);
    let buckets = totals
        .into_iter()
        .map(|(key, seconds)| Bucket {
            key,
            seconds,
            percent: percent(seconds, total),
        })
        .collect();

    (total, buckets)
}

use thiserror::Error;

/// 集計処理で発生するエラー。
#[derive(Debug, Error)]
pub enum TrackerError {
    /// 対象の行が存在しない。
    ///
    /// 「活動なし」が正当な結果となる集計では空の結果に変換され、ここまで上がってこない。
    #[error("{0} not found")]
    NotFound(&'static str),

    /// ストアが失敗した。リトライはせず、そのまま呼び出し元へ伝播する。
    #[error("store failure")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} already exists")]
    AlreadyExists(String),
}

impl TrackerError {
    /// ストアのエラーを`TrackerError::Store`に包む。
    pub fn store(err: anyhow::Error) -> Self {
        Self::Store(err.into())
    }
}

/// ストアから取得した行。
///
/// 0件を`Empty`として明示し、操作ごとに空を成功とするか`NotFound`とするかを呼び出し側で決める。
#[derive(Clone, Debug, PartialEq)]
pub enum Rows<T> {
    Found(Vec<T>),
    Empty,
}

impl<T> Rows<T> {
    /// `Vec`から`Rows`を作る。空の場合は`Empty`となる。
    pub fn from_vec(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            Self::Empty
        } else {
            Self::Found(rows)
        }
    }

    /// 空を正当な結果として扱い、行を返す。
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Found(rows) => rows,
            Self::Empty => Vec::new(),
        }
    }

    /// 空を`NotFound`として扱う。
    pub fn found(self, what: &'static str) -> Result<Vec<T>, TrackerError> {
        match self {
            Self::Found(rows) => Ok(rows),
            Self::Empty => Err(TrackerError::NotFound(what)),
        }
    }
}

//! クレート全体のエラー型。

use std::fmt;

/// 学習・評価で発生しうるエラー。
///
/// リトライは一切行いません。いずれのエラーも学習ループを即座に停止させ、
/// 呼び出し元（`main`）まで伝播します。
#[derive(Debug)]
pub enum PinnError {
    /// 不正な設定（層構成・学習率・損失重みなど）。
    Config(String),
    /// 勾配追跡が有効でないテンソルに対する微分要求、
    /// または指定した入力から計算されていない出力に対する微分要求。
    GradientTracking(String),
    /// 学習中に損失が非有限（NaN/Inf）になった。
    /// 最後に有効だった反復番号と損失値を診断用に保持します。
    NumericalDivergence {
        iteration: usize,
        last_loss: Option<f32>,
    },
}

impl fmt::Display for PinnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "invalid configuration: {msg}"),
            Self::GradientTracking(msg) => write!(f, "gradient tracking error: {msg}"),
            Self::NumericalDivergence {
                iteration,
                last_loss,
            } => match last_loss {
                Some(loss) => write!(
                    f,
                    "loss became non-finite at iteration {iteration} (last valid loss: {loss:.6})"
                ),
                None => write!(f, "loss became non-finite at iteration {iteration}"),
            },
        }
    }
}

impl std::error::Error for PinnError {}

use clap::{Parser, Subcommand};

/// clapでコマンドラインの構造を定義します。
#[derive(Parser, Debug)]
#[command(author, version, about = "Physics-Informed Neural Network for the nonlinear pendulum with Burn", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 実行するサブコマンドを定義します（train または infer）。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// データ適合のみのANNとPINNの両モデルを学習し、結果をファイルに保存します
    Train,
    /// 保存された両モデルを読み込み、参照解に対する相対L2誤差を評価します
    Infer,
}

//! # 非線形振り子 PINN サンプルプログラム
//!
//! `burn` フレームワークを使用して、疎でノイズを含む観測データから
//! 非線形振り子の運動方程式の解を推定します。データ適合のみのANNと、
//! 運動方程式の残差を損失に組み込んだPINNを同一条件で学習し、比較します。
//!
//! `clap` クレートを利用して、コマンドラインから`train`（学習）と`infer`（評価）の
//! 機能を個別に実行できます。
//!
//! ## 使い方
//!
//! ### 学習
//! ```bash
//! cargo run --release -- train
//! ```
//!
//! ### 評価
//! ```bash
//! cargo run --release -- infer
//! ```

use clap::Parser;
use pendulum_pinn::cli::{Cli, Commands};
use pendulum_pinn::{inference, training};

/// プログラムのエントリーポイント。
///
/// コマンドライン引数を解析し、`train`または`infer`の処理に振り分けます。
fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Train => training::run(),
        Commands::Infer => inference::run(),
    };

    if let Err(e) = result {
        eprintln!("エラー: {e}");
        std::process::exit(1);
    }
}

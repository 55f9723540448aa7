//! # 非線形振り子の物理情報ニューラルネットワーク (PINN)
//!
//! `burn` フレームワークを使用して、疎でノイズを含む観測データから
//! 非線形振り子の運動方程式 θ'' + (g/L)·sin θ = 0 の解を推定します。
//!
//! 同一のネットワーク構成を2通りの方法で学習します。
//!
//! - データ適合のみの回帰モデル（ベースライン）
//! - 物理残差・初期条件・初速度条件・データ適合の4項損失を持つ PINN
//!
//! 2階の時間微分は `Autodiff` バックエンドを入れ子にすることで計算します。
//! 微分結果が1段下の計算グラフに残るため、微分演算子を2回合成しても
//! パラメータに対する勾配が失われません。

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grad;
pub mod inference;
pub mod metrics;
pub mod model;
pub mod pinn;
pub mod training;

/// データ適合のみで学習したモデルを保存するファイル名
pub const ANN_MODEL_FILENAME: &str = "pendulum_ann.mpk";

/// PINN として学習したモデルを保存するファイル名
pub const PINN_MODEL_FILENAME: &str = "pendulum_pinn.mpk";

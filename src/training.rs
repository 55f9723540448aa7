//! 学習ループの駆動。
//!
//! 固定反復数の Adam 最適化を実行し、損失履歴を記録します。
//! 収束判定による早期終了・ミニバッチ・学習率スケジューリングは行わず、
//! 常に設定された反復予算を使い切ります。損失が非有限になった場合は
//! 致命的エラーとして即座に停止します。

use crate::config::{DataConfig, PendulumSystem, TrainingConfig};
use crate::dataset::{observe, solve_reference, to_column_tensor};
use crate::error::PinnError;
use crate::model::PendulumNet;
use crate::pinn::{PinnBatch, data_only_loss, pinn_loss};
use crate::{ANN_MODEL_FILENAME, PINN_MODEL_FILENAME};
use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};
use plotters::prelude::*;
use std::time::Instant;

type MyBackend = Autodiff<NdArray<f32>>;

/// 学習の結果。学習済みモデルと反復ごとの損失履歴（追記のみ）。
pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model: PendulumNet<B>,
    pub loss_history: Vec<f32>,
}

/// 固定予算の Adam 最適化ループ。
///
/// 各反復で (1) 損失を計算し、(2) スカラー値を履歴に記録し、
/// (3) 逆伝播で全パラメータの勾配を求め、(4) Adam で1ステップ更新します。
/// 損失関数は毎回同じモデルインスタンス（最新パラメータ）から計算されます。
pub fn fit<B, F>(
    mut model: PendulumNet<B>,
    config: &TrainingConfig,
    mut loss_fn: F,
) -> Result<TrainingOutcome<B>, PinnError>
where
    B: AutodiffBackend,
    F: FnMut(&PendulumNet<B>) -> Result<Tensor<B, 1>, PinnError>,
{
    let mut optim = AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
        .init();
    let mut loss_history = Vec::with_capacity(config.iterations);

    for iteration in 0..config.iterations {
        let loss = loss_fn(&model)?;
        let loss_value: f32 = loss.clone().into_scalar().elem();
        if !loss_value.is_finite() {
            return Err(PinnError::NumericalDivergence {
                iteration,
                last_loss: loss_history.last().copied(),
            });
        }
        loss_history.push(loss_value);

        if iteration % config.log_every == 0 {
            println!("[Iter {iteration}] Loss: {loss_value:.6}");
        }

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optim.step(config.learning_rate, model, grads);
    }

    Ok(TrainingOutcome {
        model,
        loss_history,
    })
}

/// `train`サブコマンドを実行します。
///
/// 参照軌道と観測データを生成し、同一構成のネットワークを
/// データ適合のみ（ANN）と PINN の2通りで学習して、損失グラフの描画と
/// 学習済みモデルのファイル保存を行います。
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let system = PendulumSystem::default();
    let data_config = DataConfig::default();
    let config = TrainingConfig::default();
    config.validate()?;

    let device = Default::default();
    MyBackend::seed(config.seed);

    // --- 参照軌道と観測データの準備 ---
    let reference = solve_reference(&system, &data_config);
    let observations = observe(&reference, &data_config)?;
    println!("SNR: {:.4} dB", observations.snr_db);
    println!("観測データ点数: {}", observations.time.len());

    let t_physics = to_column_tensor::<MyBackend>(&reference.time, &device);
    let t_data = to_column_tensor::<MyBackend>(&observations.time, &device);
    let theta_data = to_column_tensor::<MyBackend>(&observations.theta, &device);
    let t_zero = Tensor::<MyBackend, 2>::zeros([1, 1], &device);

    let training_start = Instant::now();

    // --- データ適合のみの ANN ---
    let ann = PendulumNet::<MyBackend>::new(&config.layer_widths, &device)?;
    println!("学習可能パラメータ数: {}", ann.num_params());
    println!("学習を開始します (データ適合のみ) - バックエンド: NdArray (CPU)");
    let ann_outcome = fit(ann, &config, |model| {
        Ok(data_only_loss(model, t_data.clone(), theta_data.clone()))
    })?;

    // --- PINN ---
    let pinn = PendulumNet::<MyBackend>::new(&config.layer_widths, &device)?;
    let batch = PinnBatch {
        t_physics: t_physics.clone(),
        t_zero: t_zero.clone(),
        t_data: t_data.clone(),
        theta_data: theta_data.clone(),
    };
    println!("学習を開始します (PINN) - バックエンド: NdArray (CPU)");
    let pinn_outcome = fit(pinn, &config, |model| {
        pinn_loss(model, &batch, &system, &config.weights)
    })?;

    let training_duration = training_start.elapsed();
    println!("学習が完了しました。");
    println!("=> 学習時間: {:.2?}", training_duration);

    // --- 結果の保存と描画 ---
    plot_loss_history(&ann_outcome.loss_history, &pinn_outcome.loss_history)?;
    println!("=> 損失グラフを 'loss_graph.png' に保存しました。");

    println!("学習済みモデルを保存中...");
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    ann_outcome.model.save_file(ANN_MODEL_FILENAME, &recorder)?;
    pinn_outcome.model.save_file(PINN_MODEL_FILENAME, &recorder)?;
    println!("=> モデルを '{ANN_MODEL_FILENAME}' と '{PINN_MODEL_FILENAME}' に保存しました。");

    Ok(())
}

/// 学習過程の損失をグラフとしてPNGファイルに出力します。
fn plot_loss_history(
    ann_hist: &[f32],
    pinn_hist: &[f32],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new("loss_graph.png", (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let to_log = |hist: &[f32]| -> Vec<f32> {
        hist.iter().map(|v| v.max(1e-12).log10()).collect()
    };
    let ann_log = to_log(ann_hist);
    let pinn_log = to_log(pinn_hist);
    let mut min_log = f32::INFINITY;
    let mut max_log = f32::NEG_INFINITY;
    for value in ann_log.iter().chain(&pinn_log) {
        min_log = min_log.min(*value);
        max_log = max_log.max(*value);
    }
    let n = ann_hist.len().max(pinn_hist.len());

    let mut chart = ChartBuilder::on(&root)
        .caption("Loss History", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0..n, (min_log - 0.5)..(max_log + 0.5))?;
    chart
        .configure_mesh()
        .y_desc("Loss (log10 scale)")
        .x_desc("Iteration")
        .draw()?;
    chart
        .draw_series(LineSeries::new(
            ann_log.iter().enumerate().map(|(i, &v)| (i, v)),
            &RED,
        ))?
        .label("ANN (data only)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    chart
        .draw_series(LineSeries::new(
            pinn_log.iter().enumerate().map(|(i, &v)| (i, v)),
            &BLUE,
        ))?
        .label("PINN")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

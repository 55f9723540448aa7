//! 学習済みモデルの評価。
//!
//! 保存された両モデル（データ適合のみの ANN と PINN）を読み込み、
//! 学習に使っていない稠密な時間格子上で予測を行い、参照軌道に対する
//! 相対 L2 誤差と、微分演算子で評価した |θ'(0)| を報告します。

use crate::config::{DataConfig, PendulumSystem, TrainingConfig};
use crate::dataset::{solve_reference, to_column_tensor};
use crate::error::PinnError;
use crate::metrics::relative_l2_error;
use crate::model::PendulumNet;
use crate::pinn::velocity;
use crate::{ANN_MODEL_FILENAME, PINN_MODEL_FILENAME};
use burn::backend::NdArray;
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::Tensor;
use plotters::prelude::*;
use std::path::Path;
use std::time::Instant;

type MyBackend = NdArray<f32>;

/// `infer`サブコマンドを実行します。
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let device = Default::default();
    let system = PendulumSystem::default();
    let data_config = DataConfig::default();
    let config = TrainingConfig::default();
    config.validate()?;

    for filename in [ANN_MODEL_FILENAME, PINN_MODEL_FILENAME] {
        if !Path::new(filename).exists() {
            return Err(format!(
                "モデルファイル '{filename}' が見つかりません。\n最初に 'train' コマンドでモデルを学習・保存してください。"
            )
            .into());
        }
    }

    println!("\n評価を実行します - バックエンド: NdArray (CPU)");
    let inference_start = Instant::now();

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let ann = PendulumNet::<MyBackend>::new(&config.layer_widths, &device)?
        .load_file(ANN_MODEL_FILENAME, &recorder, &device)?;
    let pinn = PendulumNet::<MyBackend>::new(&config.layer_widths, &device)?
        .load_file(PINN_MODEL_FILENAME, &recorder, &device)?;

    let reference = solve_reference(&system, &data_config);
    let t_grid = to_column_tensor::<MyBackend>(&reference.time, &device);
    let theta_ref = to_column_tensor::<MyBackend>(&reference.theta, &device);

    let ann_pred = ann.forward(t_grid.clone());
    let pinn_pred = pinn.forward(t_grid);

    println!(
        "相対L2誤差 (データ適合のみ): {:.6}",
        relative_l2_error(&ann_pred, &theta_ref)
    );
    println!(
        "相対L2誤差 (PINN): {:.6}",
        relative_l2_error(&pinn_pred, &theta_ref)
    );

    let theta_dot_at_zero = |model: &PendulumNet<MyBackend>| -> Result<f32, PinnError> {
        let t_zero = Tensor::<MyBackend, 2>::zeros([1, 1], &device);
        Ok(velocity(model, t_zero)?.into_scalar())
    };
    println!("|θ'(0)| (データ適合のみ): {:.6}", theta_dot_at_zero(&ann)?.abs());
    println!("|θ'(0)| (PINN): {:.6}", theta_dot_at_zero(&pinn)?.abs());

    let ann_values = ann_pred.into_data().to_vec::<f32>().unwrap();
    let pinn_values = pinn_pred.into_data().to_vec::<f32>().unwrap();
    plot_comparison(&reference.time, &reference.theta, &ann_values, &pinn_values)?;
    println!("=> 比較グラフを 'comparison.png' に保存しました。");
    println!("=> 評価時間: {:.2?}", inference_start.elapsed());

    Ok(())
}

/// 参照軌道と両モデルの予測を1枚のグラフに重ねてPNGに出力します。
fn plot_comparison(
    time: &[f64],
    theta_ref: &[f64],
    ann_pred: &[f32],
    pinn_pred: &[f32],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new("comparison.png", (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let t_max = time.last().copied().unwrap_or(1.0);
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for &value in theta_ref {
        y_min = y_min.min(value);
        y_max = y_max.max(value);
    }
    for &value in ann_pred.iter().chain(pinn_pred) {
        y_min = y_min.min(value as f64);
        y_max = y_max.max(value as f64);
    }

    let mut chart = ChartBuilder::on(&root)
        .caption("Angular Displacement: Reference vs. Predicted", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..t_max, (y_min - 0.2)..(y_max + 0.2))?;
    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Theta (rad)")
        .draw()?;
    chart
        .draw_series(LineSeries::new(
            time.iter().zip(theta_ref).map(|(&t, &v)| (t, v)),
            &BLACK,
        ))?
        .label("Reference (RK4)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));
    chart
        .draw_series(LineSeries::new(
            time.iter().zip(ann_pred).map(|(&t, &v)| (t, v as f64)),
            &RED,
        ))?
        .label("ANN (data only)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    chart
        .draw_series(LineSeries::new(
            time.iter().zip(pinn_pred).map(|(&t, &v)| (t, v as f64)),
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

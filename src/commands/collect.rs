//! # collect 命令实现
//!
//! 并行扫描根目录下的每个计算子目录，读取结果（不删除 `results.tag`），
//! 按总能量排序并输出表格与 CSV。
//!
//! ## 依赖关系
//! - 使用 `cli/collect.rs` 定义的参数
//! - 使用 `parsers/outputs.rs`, `commands/parse.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`
//! - 使用 `rayon` 并行读取

use super::parse::load_structure;
use crate::cli::collect::CollectArgs;
use crate::error::{DftbKitError, Result};
use crate::models::DftbResults;
use crate::parsers::outputs::{self, ReadOptions, RESULTS_TAG};
use crate::utils::{output, progress};

use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 单个计算的汇总
#[derive(Debug, Clone)]
struct CollectedRun {
    name: String,
    formula: String,
    natoms: usize,
    results: DftbResults,
}

/// 终端表格行
#[derive(Debug, Clone, Tabled)]
struct RankRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Calculation")]
    name: String,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "E/atom (eV)")]
    energy_per_atom: String,
    #[tabled(rename = "ΔE/atom (eV)")]
    delta: String,
}

/// CSV 行
#[derive(Debug, Clone, Serialize)]
struct CsvRow {
    rank: usize,
    calculation: String,
    formula: String,
    natoms: usize,
    #[serde(rename = "energy_eV")]
    energy: f64,
    #[serde(rename = "energy_per_atom_eV")]
    energy_per_atom: f64,
    #[serde(rename = "fermi_level_eV")]
    fermi_level: Option<f64>,
    #[serde(rename = "max_force_eV_A")]
    max_force: Option<f64>,
}

/// 执行 collect 命令
pub fn execute(args: CollectArgs) -> Result<()> {
    output::print_header("Collecting DFTB+ Results");

    if !args.root.is_dir() {
        return Err(DftbKitError::DirectoryNotFound {
            path: args.root.display().to_string(),
        });
    }

    let dirs = calculation_dirs(&args.root)?;
    if dirs.is_empty() {
        output::print_warning(&format!(
            "No subdirectory of '{}' contains {}",
            args.root.display(),
            RESULTS_TAG
        ));
        return Ok(());
    }
    output::print_info(&format!("Reading {} calculations...", dirs.len()));

    let jobs = if args.jobs == 0 { num_cpus::get() } else { args.jobs };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| DftbKitError::InvalidArgument(format!("thread pool: {}", e)))?;

    let options = ReadOptions {
        read_forces: !args.no_forces,
    };
    let pb = progress::create_progress_bar(dirs.len() as u64, "Parsing");

    let outcomes: Vec<(PathBuf, Result<CollectedRun>)> = pool.install(|| {
        dirs.par_iter()
            .map(|dir| {
                let outcome = collect_one(dir, options);
                pb.inc(1);
                (dir.clone(), outcome)
            })
            .collect()
    });
    pb.finish_and_clear();

    let mut runs = Vec::new();
    for (dir, outcome) in outcomes {
        match outcome {
            Ok(run) => runs.push(run),
            Err(e) => output::print_warning(&format!("{}: {}", dir.display(), e)),
        }
    }

    if runs.is_empty() {
        output::print_warning("No calculation could be read.");
        return Ok(());
    }

    rank_runs(&mut runs);
    output::print_info(&format!("Read {} of {} calculations", runs.len(), dirs.len()));

    let shown = args.top_n.min(runs.len());
    output::print_header(&format!("Top {} Calculations by Energy per Atom", shown));
    println!("{}", Table::new(rank_rows(&runs, args.top_n)));

    save_ranking_csv(&runs, &args.output_csv)?;
    output::print_success(&format!(
        "Full ranking saved to '{}'",
        args.output_csv.display()
    ));

    Ok(())
}

/// 含有 results.tag 的直接子目录（按名称排序）
fn calculation_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)
        .map_err(|e| DftbKitError::FileReadError {
            path: root.display().to_string(),
            source: e,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(RESULTS_TAG).is_file())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn collect_one(dir: &Path, options: ReadOptions) -> Result<CollectedRun> {
    let structure = load_structure(dir, None)?;
    let results = outputs::read_outputs(dir, structure.len(), options)?;

    Ok(CollectedRun {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        formula: structure.formula(),
        natoms: structure.len(),
        results,
    })
}

fn energy_per_atom(run: &CollectedRun) -> f64 {
    run.results
        .energy_per_atom(run.natoms)
        .unwrap_or(run.results.energy)
}

/// 按每原子能量升序排列
fn rank_runs(runs: &mut [CollectedRun]) {
    runs.sort_by(|a, b| energy_per_atom(a).total_cmp(&energy_per_atom(b)));
}

fn rank_rows(runs: &[CollectedRun], top_n: usize) -> Vec<RankRow> {
    let reference = runs.first().map(energy_per_atom).unwrap_or(0.0);
    runs.iter()
        .take(top_n)
        .enumerate()
        .map(|(i, run)| {
            let e = energy_per_atom(run);
            RankRow {
                rank: i + 1,
                name: run.name.clone(),
                formula: run.formula.clone(),
                energy_per_atom: format!("{:.6}", e),
                delta: format!("{:.6}", e - reference),
            }
        })
        .collect()
}

fn save_ranking_csv(runs: &[CollectedRun], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for (i, run) in runs.iter().enumerate() {
        wtr.serialize(CsvRow {
            rank: i + 1,
            calculation: run.name.clone(),
            formula: run.formula.clone(),
            natoms: run.natoms,
            energy: run.results.energy,
            energy_per_atom: energy_per_atom(run),
            fermi_level: run.results.fermi_level(),
            max_force: run.results.max_force(),
        })?;
    }
    wtr.flush().map_err(|e| DftbKitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

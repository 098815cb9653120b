//! # run 命令实现
//!
//! 写出输入文件，执行一次 DFTB+，读取并展示结果。
//! 结果读取后 `results.tag` 被删除。
//!
//! ## 依赖关系
//! - 使用 `cli/calc.rs` 定义的参数
//! - 使用 `commands/input.rs`, `commands/report.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use super::{input, report};
use crate::cli::calc::RunArgs;
use crate::error::Result;
use crate::utils::{output, progress};

/// 执行 run 命令
pub fn execute(args: RunArgs) -> Result<()> {
    output::print_header("Running DFTB+");

    let (calc, structure) = input::build_calculator(&args.calc)?;
    input::write_input(&calc, &structure)?;

    let spinner = progress::create_spinner(&format!("Running '{}'", calc.command()));
    let status = calc.run();
    spinner.finish_and_clear();
    status?;
    output::print_success(&format!(
        "DFTB+ finished, output in '{}'",
        calc.directory().join(format!("{}.out", calc.label())).display()
    ));

    let results = calc.read_results(structure.len())?;
    report::print_results(&results, &structure);

    match calc.read_point_charge_forces() {
        Ok(Some(forces)) => {
            let max = forces
                .iter()
                .map(|f| (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt())
                .fold(0.0, f64::max);
            output::print_info(&format!(
                "Forces on {} external charges, max |F| = {:.6} eV/Å",
                forces.len(),
                max
            ));
        }
        Ok(None) => {}
        Err(e) => output::print_warning(&format!("No forces on external charges: {}", e)),
    }

    if let Some(path) = &args.output_csv {
        report::save_atoms_csv(&results, &structure, path)?;
        output::print_success(&format!("Per-atom results saved to '{}'", path.display()));
    }

    Ok(())
}

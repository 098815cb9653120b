//! # DFTB+ 计算器
//!
//! 持有一次计算的全部设置：标签、计算目录、SKF 目录、可执行命令、
//! 用户参数、k 点与可选的外部点电荷势。
//!
//! 工作流程：
//! 1. `write_input` 写出 `dftb_in.hsd`、`geo_end.gen` 与点电荷文件
//! 2. `run` 在计算目录中执行一次外部程序（不重试）
//! 3. `read_results` 解析结果并删除 `results.tag`，
//!    同一结果只能被读取一次
//!
//! ## 依赖关系
//! - 被 `commands/input.rs`, `commands/run.rs` 使用
//! - 使用 `input/`, `parsers/`, `calculator/pcpot.rs`

use super::pcpot::PointChargePotential;
use crate::error::{DftbKitError, Result};
use crate::input::renderer::MAX_ANGULAR_MOMENTUM_PREFIX;
use crate::input::{
    render, with_angular_momentum_defaults, KPoints, ParameterSet, RenderContext, RenderedInput,
};
use crate::models::{DftbResults, Structure};
use crate::parsers::gen::to_gen_string;
use crate::parsers::outputs::{self, ReadOptions};

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const DEFAULT_LABEL: &str = "dftb";
pub const DEFAULT_SLAKO_DIR: &str = "./";
pub const DEFAULT_COMMAND: &str = "dftb+";

pub const INPUT_FILE: &str = "dftb_in.hsd";
pub const GEOMETRY_FILE: &str = "geo_end.gen";

/// DFTB+ 计算器
#[derive(Debug, Clone)]
pub struct Dftb {
    label: String,
    directory: PathBuf,
    slako_dir: String,
    command: String,
    params: ParameterSet,
    kpoints: Option<KPoints>,
    pcpot: Option<PointChargePotential>,
    do_forces: bool,
    many_steps: bool,
}

/// SKF 目录统一以单个 `/` 结尾
fn normalize_slako_dir(dir: &str) -> String {
    let trimmed = dir.trim_end_matches('/');
    if trimmed.is_empty() && dir.starts_with('/') {
        return "/".to_string();
    }
    format!("{}/", trimmed)
}

impl Dftb {
    /// `many_steps` 为真时不写入单点计算的 Driver 默认值（MD、优化由用户参数控制）
    pub fn new(directory: impl Into<PathBuf>, many_steps: bool) -> Self {
        Dftb {
            label: DEFAULT_LABEL.to_string(),
            directory: directory.into(),
            slako_dir: DEFAULT_SLAKO_DIR.to_string(),
            command: DEFAULT_COMMAND.to_string(),
            params: ParameterSet::new(),
            kpoints: None,
            pcpot: None,
            do_forces: false,
            many_steps,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_slako_dir(mut self, dir: &str) -> Self {
        self.slako_dir = normalize_slako_dir(dir);
        self
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.command = command.to_string();
        self
    }

    pub fn with_forces(mut self, do_forces: bool) -> Self {
        self.do_forces = do_forces;
        self
    }

    pub fn with_kpoints(mut self, kpoints: KPoints) -> Self {
        self.kpoints = Some(kpoints);
        self
    }

    /// 挂载外部点电荷势
    pub fn embed(mut self, pcpot: PointChargePotential) -> Self {
        self.pcpot = Some(pcpot);
        self
    }

    /// 设置单个用户参数（覆盖默认值）
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.params.set(key, value);
        self
    }

    /// 批量设置用户参数
    pub fn set_parameters(&mut self, params: &ParameterSet) -> &mut Self {
        self.params.merge(params);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn slako_dir(&self) -> &str {
        &self.slako_dir
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn pcpot(&self) -> Option<&PointChargePotential> {
        self.pcpot.as_ref()
    }

    /// 默认参数
    pub fn default_parameters(&self) -> ParameterSet {
        let mut params = ParameterSet::new();
        params.set("Hamiltonian_", "DFTB");
        params.set("Hamiltonian_SlaterKosterFiles_", "Type2FileNames");
        params.set(
            "Hamiltonian_SlaterKosterFiles_Prefix",
            format!("\"{}\"", self.slako_dir),
        );
        params.set("Hamiltonian_SlaterKosterFiles_Separator", "\"-\"");
        params.set("Hamiltonian_SlaterKosterFiles_Suffix", "\".skf\"");
        params.set(MAX_ANGULAR_MOMENTUM_PREFIX, "");

        if !self.many_steps {
            params.set("Driver_", "ConjugateGradient");
            params.set("Driver_MaxForceComponent", "1E-4");
            params.set("Driver_MaxSteps", "0");
        }
        params
    }

    /// 默认参数 + 用户参数 + k 点
    pub fn parameters(&self, structure: &Structure) -> ParameterSet {
        let mut params = self.default_parameters();
        params.merge(&self.params);
        if let Some(kpoints) = &self.kpoints {
            kpoints.apply(&mut params, structure.lattice.as_ref());
        }
        params
    }

    /// 自旋通道数：`Hamiltonian_SpinPolarisation` 含 `colinear` 时为 2
    pub fn nspin(&self) -> usize {
        let colinear = ["Hamiltonian_SpinPolarisation", "Hamiltonian_SpinPolarisation_"]
            .iter()
            .filter_map(|k| self.params.get(k))
            .any(|v| v.to_lowercase().contains("colinear"));
        if colinear {
            2
        } else {
            1
        }
    }

    /// 渲染 `dftb_in.hsd`（不写文件）
    pub fn render_input(&self, structure: &Structure) -> Result<RenderedInput> {
        let params = with_angular_momentum_defaults(
            &self.parameters(structure),
            &structure.species(),
            Path::new(&self.slako_dir),
        )?;

        let ctx = RenderContext {
            directory: &self.directory,
            // 没有电荷时不写 ElectricField 块
            point_charges: self
                .pcpot
                .as_ref()
                .filter(|pcpot| !pcpot.is_empty())
                .map(PointChargePotential::len),
            do_forces: self.do_forces,
        };
        Ok(render(&params, &ctx))
    }

    /// 写出全部输入文件，返回需要提示用户的警告
    pub fn write_input(&self, structure: &Structure) -> Result<Vec<String>> {
        fs::create_dir_all(&self.directory).map_err(|e| DftbKitError::FileWriteError {
            path: self.directory.display().to_string(),
            source: e,
        })?;

        let rendered = self.render_input(structure)?;
        let mut warnings = rendered.warnings;

        write_file(&self.directory.join(INPUT_FILE), &rendered.text)?;
        write_file(&self.directory.join(GEOMETRY_FILE), &to_gen_string(structure))?;

        if let Some(pcpot) = &self.pcpot {
            if !pcpot.write_mmcharges(&self.directory)? {
                warnings.push("No external charges given, charge file not written".to_string());
            }
        }

        Ok(warnings)
    }

    /// 在计算目录中执行一次外部程序，标准输出重定向到 `<label>.out`
    pub fn run(&self) -> Result<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DftbKitError::InvalidArgument("empty DFTB+ command".to_string()))?;

        let out_path = self.directory.join(format!("{}.out", self.label));
        let stdout = File::create(&out_path).map_err(|e| DftbKitError::FileWriteError {
            path: out_path.display().to_string(),
            source: e,
        })?;

        let output = Command::new(program)
            .args(parts)
            .current_dir(&self.directory)
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DftbKitError::CommandNotFound {
                    command: program.to_string(),
                },
                _ => DftbKitError::CommandFailed {
                    command: self.command.clone(),
                    stderr: e.to_string(),
                },
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(DftbKitError::CommandFailed {
                command: self.command.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }

    /// 解析计算结果并删除 `results.tag`；再次读取将返回 `FileNotFound`
    pub fn read_results(&self, natoms: usize) -> Result<DftbResults> {
        let results = outputs::read_outputs(&self.directory, natoms, ReadOptions::default())?;
        outputs::consume_results_tag(&self.directory)?;
        Ok(results)
    }

    /// 作用在外部点电荷上的力；未挂载点电荷势时为 `None`
    pub fn read_point_charge_forces(&self) -> Result<Option<Vec<[f64; 3]>>> {
        self.pcpot
            .as_ref()
            .map(|pcpot| pcpot.read_forces(&self.directory))
            .transpose()
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| DftbKitError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Lattice};
    use crate::parsers::gen::parse_gen_file;
    use crate::parsers::outputs::RESULTS_TAG;

    fn water() -> Structure {
        Structure::new(
            "water",
            vec![
                Atom::new("O", [0.0, 0.0, 0.0]),
                Atom::new("H", [0.0, 0.76, 0.59]),
                Atom::new("H", [0.0, -0.76, 0.59]),
            ],
            None,
        )
    }

    fn write_skf(dir: &Path) {
        fs::write(
            dir.join("O-O.skf"),
            "0.02 500\n-0.1 -0.2 -0.3 0.0 0.3 0.3 0.3 0.0 4.0 2.0\n",
        )
        .unwrap();
        fs::write(
            dir.join("H-H.skf"),
            "0.02 500\n0 0 -0.2 0.0 0.0 0.0 0.4 0.0 0.0 1.0\n",
        )
        .unwrap();
    }

    const TAG: &str = "\
forces              :real:2:3,3
  0.0 0.0 0.01
  0.0 0.0 -0.005
  0.0 0.0 -0.005
";

    const DETAILED: &str = "Total energy:      -4.0779379 H     -110.9668 eV\n";

    #[test]
    fn test_normalize_slako_dir() {
        assert_eq!(normalize_slako_dir("/opt/skf"), "/opt/skf/");
        assert_eq!(normalize_slako_dir("/opt/skf///"), "/opt/skf/");
        assert_eq!(normalize_slako_dir("./"), "./");
        assert_eq!(normalize_slako_dir("/"), "/");
    }

    #[test]
    fn test_default_parameters() {
        let calc = Dftb::new("calc", false).with_slako_dir("/skf");
        let params = calc.default_parameters();
        assert_eq!(params.get("Hamiltonian_"), Some("DFTB"));
        assert_eq!(params.get("Hamiltonian_SlaterKosterFiles_Prefix"), Some("\"/skf/\""));
        assert_eq!(params.get("Driver_MaxSteps"), Some("0"));

        let md = Dftb::new("calc", true);
        assert!(md.default_parameters().get("Driver_").is_none());
    }

    #[test]
    fn test_user_parameters_override_defaults() {
        let mut calc = Dftb::new("calc", false);
        calc.set("Driver_MaxSteps", "100").set("Hamiltonian_SCC", "Yes");

        let params = calc.parameters(&water());
        assert_eq!(params.get("Driver_MaxSteps"), Some("100"));
        assert_eq!(params.get("Hamiltonian_SCC"), Some("Yes"));
    }

    #[test]
    fn test_kpoints_applied_last() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        let si = Structure::new("Si", vec![Atom::new("Si", [0.0; 3])], Some(lattice));

        let calc = Dftb::new("calc", false).with_kpoints(KPoints::MonkhorstPack([2, 2, 2]));
        let params = calc.parameters(&si);
        assert_eq!(params.get("Hamiltonian_KPointsAndWeights_"), Some(""));
        assert!(params.contains_key("Hamiltonian_KPointsAndWeights_empty000000007"));
    }

    #[test]
    fn test_nspin() {
        let mut calc = Dftb::new("calc", false);
        assert_eq!(calc.nspin(), 1);
        calc.set("Hamiltonian_SpinPolarisation_", "Colinear");
        assert_eq!(calc.nspin(), 2);
    }

    #[test]
    fn test_write_input_files() {
        let dir = tempfile::tempdir().unwrap();
        write_skf(dir.path());
        let work = dir.path().join("work");

        let pcpot = PointChargePotential::new(vec![-1.0]).with_positions(vec![[5.0, 0.0, 0.0]]);
        let calc = Dftb::new(&work, false)
            .with_slako_dir(&dir.path().display().to_string())
            .embed(pcpot);
        let warnings = calc.write_input(&water()).unwrap();
        assert!(warnings.is_empty());

        let hsd = fs::read_to_string(work.join(INPUT_FILE)).unwrap();
        assert!(hsd.starts_with("Geometry = GenFormat { \n"));
        assert!(hsd.contains("      O = \"p\" \n"));
        assert!(hsd.contains("      H = \"s\" \n"));
        assert!(hsd.contains("Records = 1 \n"));
        assert_eq!(hsd.matches('{').count(), hsd.matches('}').count());

        let geometry = parse_gen_file(&work.join(GEOMETRY_FILE)).unwrap();
        assert_eq!(geometry.formula(), "H2O");
        assert!(work.join("dftb_external_charges.dat").exists());
    }

    #[test]
    fn test_empty_point_charges_skip_electric_field() {
        let dir = tempfile::tempdir().unwrap();
        write_skf(dir.path());
        let work = dir.path().join("work");

        let calc = Dftb::new(&work, false)
            .with_slako_dir(&dir.path().display().to_string())
            .embed(PointChargePotential::new(Vec::new()));
        let warnings = calc.write_input(&water()).unwrap();
        assert_eq!(warnings.len(), 1);

        let hsd = fs::read_to_string(work.join(INPUT_FILE)).unwrap();
        assert!(!hsd.contains("ElectricField"));
        assert!(!hsd.contains("Records"));
        assert_eq!(hsd.matches('{').count(), hsd.matches('}').count());
        assert!(!work.join("dftb_external_charges.dat").exists());
    }

    #[test]
    fn test_read_results_consumes_results_tag() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(RESULTS_TAG), TAG).unwrap();
        fs::write(dir.path().join("detailed.out"), DETAILED).unwrap();

        let calc = Dftb::new(dir.path(), false);
        let results = calc.read_results(3).unwrap();
        assert_eq!(results.forces.as_ref().map(Vec::len), Some(3));
        assert!(results.charges.is_none());
        assert!(!dir.path().join(RESULTS_TAG).exists());

        match calc.read_results(3) {
            Err(DftbKitError::FileNotFound { path }) => assert!(path.ends_with(RESULTS_TAG)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_command_errors() {
        let dir = tempfile::tempdir().unwrap();

        let ok = Dftb::new(dir.path(), false).with_command("true");
        ok.run().unwrap();
        assert!(dir.path().join("dftb.out").exists());

        let failing = Dftb::new(dir.path(), false).with_command("false");
        assert!(matches!(
            failing.run(),
            Err(DftbKitError::CommandFailed { .. })
        ));

        let missing = Dftb::new(dir.path(), false).with_command("no-such-dftb-binary --version");
        assert!(matches!(
            missing.run(),
            Err(DftbKitError::CommandNotFound { .. })
        ));

        let empty = Dftb::new(dir.path(), false).with_command("   ");
        assert!(matches!(empty.run(), Err(DftbKitError::InvalidArgument(_))));
    }
}

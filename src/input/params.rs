//! # 扁平层级参数
//!
//! DFTB+ 的层级输入以下划线连接的扁平键表示，例如
//! `Hamiltonian_SCC = Yes` 对应 `Hamiltonian { SCC = Yes }`。
//!
//! - 以 `_` 结尾的键打开一个块：`Hamiltonian_ = DFTB` → `Hamiltonian = DFTB{`
//! - 含 `_empty<数字>` 的键为匿名行（如 k 点列表），只写值
//! - 其余为普通叶子，名称取最后一段
//!
//! 键按字节序排列，排序结果决定块的打开与关闭顺序。
//!
//! ## 依赖关系
//! - 被 `input/renderer.rs`, `input/kpoints.rs`, `calculator/dftb.rs`, `cli/` 使用

use crate::error::{DftbKitError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static ANONYMOUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_empty\d+").expect("valid anonymous-entry regex"));

/// 特殊处理的初始电荷开关
pub const READ_INITIAL_CHARGES_KEY: &str = "Hamiltonian_ReadInitialCharges";

/// 参数键的分类，构造时确定一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// 打开一个块
    BlockOpener { label: String },
    /// 匿名列表行
    AnonymousEntry,
    /// `Hamiltonian_ReadInitialCharges`
    ReadInitialCharges,
    /// 普通 `name = value`
    Leaf { name: String },
}

/// 单个已分类的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    key: String,
    value: String,
    depth: usize,
    kind: ParameterKind,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let trimmed = key.trim_end_matches('_');
        let depth = trimmed.matches('_').count();
        let last_segment = trimmed.rsplit('_').next().unwrap_or(trimmed).to_string();

        let kind = if key.ends_with('_') {
            ParameterKind::BlockOpener {
                label: last_segment,
            }
        } else if ANONYMOUS_RE.is_match(&key) {
            ParameterKind::AnonymousEntry
        } else if key == READ_INITIAL_CHARGES_KEY {
            ParameterKind::ReadInitialCharges
        } else {
            ParameterKind::Leaf { name: last_segment }
        };

        Parameter {
            key,
            value: value.into(),
            depth,
            kind,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// 去掉末尾下划线后的 `_` 个数
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }
}

/// 有序参数集合（键 → 值文本）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖，返回旧值
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 以字节序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 以字节序返回分类后的参数
    pub fn parameters(&self) -> Vec<Parameter> {
        self.iter().map(|(k, v)| Parameter::new(k, v)).collect()
    }

    /// 是否存在以 `prefix` 开头且比它更长的键
    pub fn has_prefix_child(&self, prefix: &str) -> bool {
        self.entries
            .keys()
            .any(|k| k.starts_with(prefix) && k.len() > prefix.len())
    }

    /// 删除所有以 `prefix` 开头的键
    pub fn remove_prefixed(&mut self, prefix: &str) {
        self.entries.retain(|k, _| !k.starts_with(prefix));
    }

    /// 合并另一组参数，`other` 中的值优先
    pub fn merge(&mut self, other: &ParameterSet) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }

    /// 解析参数文件：每行 `Key_Path = value`，`#` 开头的行与空行忽略
    pub fn from_kv_text(text: &str) -> Result<Self> {
        let mut set = ParameterSet::new();
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (key, value) = parse_assignment(trimmed).map_err(|reason| {
                DftbKitError::InvalidParameter {
                    line: i + 1,
                    reason,
                }
            })?;
            set.set(key, value);
        }
        Ok(set)
    }
}

/// 解析单条 `KEY=VALUE`；值可以为空，键中允许单位修饰符 `[Kelvin]`
pub fn parse_assignment(text: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", text))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", text));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// 按最短往返表示格式化浮点数，整数值补 `.0`
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

//! Compiler configuration for extensibility.
//!
//! Grounded on `seqc::config::CompilerConfig`'s builder shape, generalized from Seq's
//! FFI-manifest/external-builtin fields to this compiler's own ambient concerns: where
//! the preprocessor looks for headers, and which assembler/linker the driver shells
//! out to.

use std::path::PathBuf;

/// A `-D NAME[=VALUE]` preprocessor definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub value: Option<String>,
}

impl Define {
    pub fn new(name: impl Into<String>) -> Self {
        Define { name: name.into(), value: None }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Define { name: name.into(), value: Some(value.into()) }
    }
}

/// Configuration for one compilation: preprocessor search path and the external
/// assembler/linker the driver invokes as subprocesses.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Root under which the target's headers, assembler, and linker are found
    /// (`<sysroot>/include`, `<sysroot>/bin/as`, `<sysroot>/bin/ld`), mirroring a
    /// cross-compiler's `--sysroot` convention.
    pub sysroot: Option<PathBuf>,

    /// Additional `-I` search directories, searched before `sysroot`'s include dir.
    pub include_dirs: Vec<PathBuf>,

    /// Preprocessor `-D` definitions.
    pub defines: Vec<Define>,

    /// Suppress the sysroot's standard include directory (`-nostdinc`).
    pub nostdinc: bool,

    /// Preprocessor executable; defaults to `cc` invoked with `-E`. `lang-c` only
    /// parses already-preprocessed text, so this always runs before parsing.
    pub preprocessor: Option<String>,

    /// Assembler executable name or path; defaults to `as` on the host `PATH` when
    /// `sysroot` is unset.
    pub assembler: Option<String>,

    /// Linker executable name or path; defaults to `ld`.
    pub linker: Option<String>,

    /// Keep the intermediate `.s` file alongside the output.
    pub keep_asm: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            sysroot: None,
            include_dirs: Vec::new(),
            defines: Vec::new(),
            nostdinc: false,
            preprocessor: None,
            assembler: None,
            linker: None,
            keep_asm: false,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    pub fn with_sysroot(mut self, path: impl Into<PathBuf>) -> Self {
        self.sysroot = Some(path.into());
        self
    }

    pub fn with_include_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(path.into());
        self
    }

    pub fn with_include_dirs(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_dirs.extend(paths);
        self
    }

    pub fn with_define(mut self, define: Define) -> Self {
        self.defines.push(define);
        self
    }

    pub fn with_nostdinc(mut self, nostdinc: bool) -> Self {
        self.nostdinc = nostdinc;
        self
    }

    pub fn with_preprocessor(mut self, preprocessor: impl Into<String>) -> Self {
        self.preprocessor = Some(preprocessor.into());
        self
    }

    pub fn with_assembler(mut self, assembler: impl Into<String>) -> Self {
        self.assembler = Some(assembler.into());
        self
    }

    pub fn with_linker(mut self, linker: impl Into<String>) -> Self {
        self.linker = Some(linker.into());
        self
    }

    /// The assembler to invoke: the configured override, else `<sysroot>/bin/as`, else
    /// bare `as` from `PATH`.
    pub fn assembler_command(&self) -> String {
        if let Some(a) = &self.assembler {
            return a.clone();
        }
        match &self.sysroot {
            Some(root) => root.join("bin").join("as").to_string_lossy().into_owned(),
            None => "as".to_string(),
        }
    }

    /// The preprocessor to invoke: the configured override, else bare `cc` from `PATH`.
    pub fn preprocessor_command(&self) -> String {
        self.preprocessor.clone().unwrap_or_else(|| "cc".to_string())
    }

    /// `-E -I... -D... [-nostdinc]`, in the order a `cc`-compatible preprocessor
    /// expects them.
    pub fn preprocessor_args(&self) -> Vec<String> {
        let mut args = vec!["-E".to_string()];
        if let Some(root) = &self.sysroot {
            args.push("-I".to_string());
            args.push(root.join("include").to_string_lossy().into_owned());
        }
        for dir in &self.include_dirs {
            args.push("-I".to_string());
            args.push(dir.to_string_lossy().into_owned());
        }
        for define in &self.defines {
            args.push(match &define.value {
                Some(v) => format!("-D{}={v}", define.name),
                None => format!("-D{}", define.name),
            });
        }
        if self.nostdinc {
            args.push("-nostdinc".to_string());
        }
        args
    }

    pub fn linker_command(&self) -> String {
        if let Some(l) = &self.linker {
            return l.clone();
        }
        match &self.sysroot {
            Some(root) => root.join("bin").join("ld").to_string_lossy().into_owned(),
            None => "ld".to_string(),
        }
    }

    /// A loadable project config file (`rrcc.toml`): the same include-dir/define
    /// settings, for a project that doesn't want to repeat CLI flags.
    pub fn merge_toml(mut self, file: &ProjectManifest) -> Self {
        self.include_dirs.extend(file.include_dirs.iter().cloned());
        self.defines.extend(file.defines.iter().map(|d| match &d.value {
            Some(v) => Define::with_value(d.name.clone(), v.clone()),
            None => Define::new(d.name.clone()),
        }));
        if file.nostdinc {
            self.nostdinc = true;
        }
        self
    }
}

/// `rrcc.toml` project manifest: the subset of [`CompilerConfig`] a project can pin in
/// a file instead of repeating on every invocation.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ProjectManifest {
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub defines: Vec<ManifestDefine>,
    #[serde(default)]
    pub nostdinc: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ManifestDefine {
    pub name: String,
    pub value: Option<String>,
}

impl ProjectManifest {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembler_command_prefers_explicit_override() {
        let cfg = CompilerConfig::new().with_sysroot("/opt/riscv").with_assembler("my-as");
        assert_eq!(cfg.assembler_command(), "my-as");
    }

    #[test]
    fn assembler_command_falls_back_to_sysroot() {
        let cfg = CompilerConfig::new().with_sysroot("/opt/riscv");
        assert_eq!(cfg.assembler_command(), "/opt/riscv/bin/as");
    }

    #[test]
    fn assembler_command_falls_back_to_path() {
        let cfg = CompilerConfig::new();
        assert_eq!(cfg.assembler_command(), "as");
    }

    #[test]
    fn preprocessor_args_include_defines_and_search_dirs() {
        let cfg = CompilerConfig::new()
            .with_include_dir("/proj/include")
            .with_define(Define::with_value("DEBUG", "1"))
            .with_nostdinc(true);
        let args = cfg.preprocessor_args();
        assert_eq!(args, vec!["-E", "-I", "/proj/include", "-DDEBUG=1", "-nostdinc"]);
    }

    #[test]
    fn manifest_parses_minimal_toml() {
        let manifest = ProjectManifest::from_toml("nostdinc = true\n").unwrap();
        assert!(manifest.nostdinc);
        assert!(manifest.include_dirs.is_empty());
    }
}

//! Compile/assemble/link/archive sequencing: the subprocess boundary between this
//! crate's own Sema/Codegen and the host's C preprocessor and target toolchain.
//!
//! Grounded on `seqc::lib::compile_file_with_config`'s read-source -> parse -> check
//! -> codegen -> write-IR -> invoke-external-tool pipeline and its
//! `Command::new("clang")...output()` checked-status subprocess pattern, generalized
//! from a single hardcoded `clang` invocation to the assembler/linker named under
//! `CompilerConfig::sysroot`. `lang_c::driver::parse_preprocessed` only accepts
//! already-preprocessed text, so a preprocessor subprocess runs ahead of `lower::lower_source`
//! here rather than inside it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::codegen::Codegen;
use crate::config::CompilerConfig;
use crate::error::{CcError, CcResult, Diagnostic};
use crate::lower::lower_source;
use crate::sema::Sema;

/// Run `cfg`'s preprocessor over `source_path`, returning the preprocessed text
/// `lang-c` expects.
pub fn preprocess(source_path: &Path, cfg: &CompilerConfig) -> CcResult<String> {
    let output = Command::new(cfg.preprocessor_command())
        .args(cfg.preprocessor_args())
        .arg(source_path)
        .output()
        .map_err(|e| CcError::ExternalToolFailed { tool: "preprocessor".into(), detail: e.to_string() })?;
    if !output.status.success() {
        return Err(CcError::ExternalToolFailed {
            tool: "preprocessor".into(),
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    String::from_utf8(output.stdout)
        .map_err(|e| CcError::ExternalToolFailed { tool: "preprocessor".into(), detail: e.to_string() })
}

/// Preprocess, parse, check, and generate assembly text for one translation unit.
/// Returns the first `Diagnostic` hit (Sema and Codegen both stop at the first
/// error; there is no recovery pass).
pub fn compile_to_assembly(source_path: &Path, cfg: &CompilerConfig) -> Result<String, Diagnostic> {
    let preprocessed = preprocess(source_path, cfg).map_err(|e| Diagnostic::new(e, Vec::new()))?;
    let (unit, node_count) =
        lower_source(&preprocessed, source_path.to_path_buf()).map_err(|e| Diagnostic::new(e, Vec::new()))?;

    let mut sema = Sema::new(node_count);
    sema.check_unit(&unit).map_err(|e| sema.diagnostic(e))?;

    let mut codegen = Codegen::new(&sema.records);
    codegen.gen_unit(&unit).map_err(|e| Diagnostic::new(e, Vec::new()))?;
    Ok(codegen.finish(&sema.str_pool))
}

/// Assemble `asm_text` into an object file at `obj_path` by shelling out to
/// `cfg`'s assembler.
pub fn assemble(asm_text: &str, obj_path: &Path, cfg: &CompilerConfig) -> CcResult<()> {
    let mut asm_file = tempfile::Builder::new().suffix(".s").tempfile()?;
    use std::io::Write;
    asm_file.write_all(asm_text.as_bytes())?;

    let output = Command::new(cfg.assembler_command())
        .arg(asm_file.path())
        .arg("-o")
        .arg(obj_path)
        .output()
        .map_err(|e| CcError::ExternalToolFailed { tool: "assembler".into(), detail: e.to_string() })?;
    if !output.status.success() {
        return Err(CcError::ExternalToolFailed {
            tool: "assembler".into(),
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Link `objects` into the executable at `output_path` by shelling out to `cfg`'s
/// linker.
pub fn link(objects: &[PathBuf], output_path: &Path, cfg: &CompilerConfig) -> CcResult<()> {
    let output = Command::new(cfg.linker_command())
        .args(objects)
        .arg("-o")
        .arg(output_path)
        .output()
        .map_err(|e| CcError::ExternalToolFailed { tool: "linker".into(), detail: e.to_string() })?;
    if !output.status.success() {
        return Err(CcError::ExternalToolFailed {
            tool: "linker".into(),
            detail: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

/// Pack `objects` into a `tar`-format static archive at `archive_path`, each entry
/// named by its file name.
pub fn archive_objects(objects: &[PathBuf], archive_path: &Path) -> CcResult<()> {
    let file = fs::File::create(archive_path)?;
    let mut builder = tar::Builder::new(file);
    for obj in objects {
        let name = obj
            .file_name()
            .ok_or_else(|| CcError::Io(format!("{} has no file name", obj.display())))?;
        builder.append_path_with_name(obj, name)?;
    }
    builder.finish()?;
    Ok(())
}

/// Unpack a `tar`-format static archive into `dest_dir`, creating it if needed.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> CcResult<()> {
    fs::create_dir_all(dest_dir)?;
    let file = fs::File::open(archive_path)?;
    let mut archive = tar::Archive::new(file);
    archive.unpack(dest_dir)?;
    Ok(())
}

/// Compile one C source file straight through to an executable: preprocess, check,
/// generate assembly, assemble, link. `source_path`'s diagnostics (if any) are
/// returned verbatim for the caller to print.
pub fn compile_to_executable(source_path: &Path, output_path: &Path, cfg: &CompilerConfig) -> Result<(), Diagnostic> {
    let asm_text = compile_to_assembly(source_path, cfg)?;
    if cfg.keep_asm {
        fs::write(output_path.with_extension("s"), &asm_text)
            .map_err(|e| Diagnostic::new(CcError::Io(e.to_string()), Vec::new()))?;
    }
    let obj = tempfile::Builder::new()
        .suffix(".o")
        .tempfile()
        .map_err(|e| Diagnostic::new(CcError::Io(e.to_string()), Vec::new()))?;
    assemble(&asm_text, obj.path(), cfg).map_err(|e| Diagnostic::new(e, Vec::new()))?;
    link(&[obj.path().to_path_buf()], output_path, cfg).map_err(|e| Diagnostic::new(e, Vec::new()))?;
    Ok(())
}

/// What to stop at, mirroring the driver CLI's `--compile`/`--assemble`/`--archive`/
/// (no switch) flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop after generating an object file per `.c`/`.s` input.
    Compile,
    /// Stop after generating assembly text per `.c` input.
    Assemble,
    /// Pack every resulting object file into one tar archive.
    Archive,
    /// Link everything into an executable, auto-prepending `crt.o`/`libc.a` from
    /// `sysroot/lib`.
    Link,
}

/// One driver invocation over an arbitrary mix of `.c`/`.s`/`.o`/`.a` input files,
/// implementing the `--compile`/`--assemble`/`--archive`/link CLI surface in one
/// pass: each input is brought up to object-file form, then `action` decides what
/// (if anything) happens with the resulting objects.
pub fn run_pipeline(inputs: &[PathBuf], action: Action, output: Option<&Path>, cfg: &CompilerConfig) -> Result<(), Diagnostic> {
    if inputs.is_empty() {
        return Err(Diagnostic::new(CcError::Io("no input files".into()), Vec::new()));
    }
    if output.is_some() && inputs.len() > 1 && matches!(action, Action::Compile | Action::Assemble) {
        return Err(Diagnostic::new(
            CcError::Io("-o requires exactly one input with --compile or --assemble".into()),
            Vec::new(),
        ));
    }

    let mut objects = Vec::new();
    let mut temp_objects = Vec::new();
    for input in inputs {
        let stem = input.file_stem().map(PathBuf::from).unwrap_or_default();
        match extension_of(input)?.as_str() {
            "c" => {
                let asm_text = compile_to_assembly(input, cfg)?;
                if action == Action::Assemble {
                    let out = output.map(PathBuf::from).unwrap_or_else(|| stem.with_extension("s"));
                    fs::write(&out, asm_text).map_err(to_diag)?;
                    continue;
                }
                let obj_path = if action == Action::Compile {
                    output.map(PathBuf::from).unwrap_or_else(|| stem.with_extension("o"))
                } else {
                    let t = tempfile::Builder::new().suffix(".o").tempfile().map_err(to_diag)?;
                    let (_, path) = t.keep().map_err(|e| to_diag(e.error))?;
                    temp_objects.push(path.clone());
                    path
                };
                assemble(&asm_text, &obj_path, cfg).map_err(|e| Diagnostic::new(e, Vec::new()))?;
                objects.push(obj_path);
            }
            "s" => {
                if action == Action::Assemble {
                    continue; // already assembly text; nothing to do
                }
                let asm_text = fs::read_to_string(input).map_err(to_diag)?;
                let obj_path = if matches!(action, Action::Compile) {
                    output.map(PathBuf::from).unwrap_or_else(|| stem.with_extension("o"))
                } else {
                    let t = tempfile::Builder::new().suffix(".o").tempfile().map_err(to_diag)?;
                    let (_, path) = t.keep().map_err(|e| to_diag(e.error))?;
                    temp_objects.push(path.clone());
                    path
                };
                assemble(&asm_text, &obj_path, cfg).map_err(|e| Diagnostic::new(e, Vec::new()))?;
                objects.push(obj_path);
            }
            "o" => objects.push(input.clone()),
            "a" => {
                let dest = tempfile::tempdir().map_err(to_diag)?;
                extract_archive(input, dest.path()).map_err(|e| Diagnostic::new(e, Vec::new()))?;
                for entry in fs::read_dir(dest.path()).map_err(to_diag)? {
                    let entry = entry.map_err(to_diag)?;
                    if entry.path().extension().is_some_and(|e| e == "o") {
                        objects.push(entry.path());
                    }
                }
                let _ = dest.into_path();
            }
            other => {
                return Err(Diagnostic::new(
                    CcError::Io(format!("{}: unrecognized input suffix .{other}", input.display())),
                    Vec::new(),
                ));
            }
        }
    }

    match action {
        Action::Compile | Action::Assemble => {}
        Action::Archive => {
            let out = output.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("out.a"));
            archive_objects(&objects, &out).map_err(|e| Diagnostic::new(e, Vec::new()))?;
        }
        Action::Link => {
            if let Some(root) = &cfg.sysroot {
                let crt = root.join("lib").join("crt.o");
                if crt.exists() {
                    objects.insert(0, crt);
                }
                let libc = root.join("lib").join("libc.a");
                if libc.exists() {
                    let dest = tempfile::tempdir().map_err(to_diag)?;
                    extract_archive(&libc, dest.path()).map_err(|e| Diagnostic::new(e, Vec::new()))?;
                    for entry in fs::read_dir(dest.path()).map_err(to_diag)? {
                        let entry = entry.map_err(to_diag)?;
                        if entry.path().extension().is_some_and(|e| e == "o") {
                            objects.push(entry.path());
                        }
                    }
                    let _ = dest.into_path();
                }
            }
            let out = output.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("a.out"));
            link(&objects, &out, cfg).map_err(|e| Diagnostic::new(e, Vec::new()))?;
        }
    }

    for path in temp_objects {
        let _ = fs::remove_file(path);
    }
    Ok(())
}

fn extension_of(path: &Path) -> Result<String, Diagnostic> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
        .ok_or_else(|| Diagnostic::new(CcError::Io(format!("{}: no recognizable suffix", path.display())), Vec::new()))
}

fn to_diag(e: std::io::Error) -> Diagnostic {
    Diagnostic::new(CcError::Io(e.to_string()), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn compile_to_assembly_reports_undefined_identifier() {
        let mut file = tempfile::Builder::new().suffix(".c").tempfile().unwrap();
        writeln!(file, "int main(void) {{ return undefined_symbol; }}").unwrap();
        let cfg = CompilerConfig::new();
        match compile_to_assembly(file.path(), &cfg) {
            Err(_) => {}
            Ok(asm) => panic!("expected a diagnostic, got assembly:\n{asm}"),
        }
    }

    #[test]
    fn archive_round_trips_object_files() {
        let dir = tempfile::tempdir().unwrap();
        let obj_path = dir.path().join("a.o");
        fs::write(&obj_path, b"not really an object file").unwrap();
        let archive_path = dir.path().join("out.a");
        archive_objects(&[obj_path.clone()], &archive_path).unwrap();

        let extract_dir = dir.path().join("extracted");
        extract_archive(&archive_path, &extract_dir).unwrap();
        let extracted = fs::read(extract_dir.join("a.o")).unwrap();
        assert_eq!(extracted, b"not really an object file");
    }
}

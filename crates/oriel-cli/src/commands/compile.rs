//! The `compile` command: run the whole pipeline against one source file.
//!
//! Exit codes: 0 on success, 1 on any diagnostic (or unusable input/output
//! paths), 2 on an internal compiler failure.

use std::fs;
use std::path::PathBuf;

use oriel_lib::Compiler;

use crate::cli::CompileParams;

pub struct CompileArgs {
    pub source: PathBuf,
    pub out: PathBuf,
    pub colored: bool,
}

impl From<CompileParams> for CompileArgs {
    fn from(params: CompileParams) -> Self {
        Self {
            source: params.source,
            out: params.out,
            colored: params.colored,
        }
    }
}

pub fn run(args: CompileArgs) -> i32 {
    let source = match fs::read_to_string(&args.source) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {}", args.source.display(), err);
            return 1;
        }
    };

    let unit = Compiler::new(source).parse().analyze().optimize();

    if !unit.diagnostics().is_empty() {
        let path = args.source.display().to_string();
        eprintln!(
            "{}",
            unit.diagnostics()
                .printer()
                .source(unit.source())
                .path(&path)
                .colored(args.colored)
                .render()
        );
    }
    if !unit.is_valid() {
        return 1;
    }

    let files = match unit.emit() {
        Ok(files) => files,
        Err(err) => {
            eprintln!("{}", err);
            return 2;
        }
    };

    if let Err(err) = fs::create_dir_all(&args.out) {
        eprintln!("error: cannot create {}: {}", args.out.display(), err);
        return 1;
    }
    for file in &files {
        let path = args.out.join(&file.name);
        if let Err(err) = fs::write(&path, &file.text) {
            eprintln!("error: cannot write {}: {}", path.display(), err);
            return 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_source(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("input.ol");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn compiles_to_one_file_per_class() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            &dir,
            "class A is this() is end end class B is this() is end end",
        );
        let out = dir.path().join("build");

        let code = run(CompileArgs {
            source,
            out: out.clone(),
            colored: false,
        });
        assert_eq!(code, 0);

        let a = fs::read_to_string(out.join("A.assembly")).unwrap();
        assert!(a.starts_with(".class public A\n"));
        assert!(out.join("B.assembly").exists());
    }

    #[test]
    fn diagnostics_exit_with_code_one() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "class A is var x : end");
        let out = dir.path().join("build");

        let code = run(CompileArgs {
            source,
            out: out.clone(),
            colored: false,
        });
        assert_eq!(code, 1);
        assert!(!out.exists(), "no output on diagnostics");
    }

    #[test]
    fn missing_source_exits_with_code_one() {
        let dir = tempfile::tempdir().unwrap();
        let code = run(CompileArgs {
            source: dir.path().join("nope.ol"),
            out: dir.path().to_path_buf(),
            colored: false,
        });
        assert_eq!(code, 1);
    }

    #[test]
    fn entry_point_file_lands_next_to_the_classes() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(
            &dir,
            "class Start is method start() is end this() is end end",
        );
        let out = dir.path().join("build");

        let code = run(CompileArgs {
            source,
            out: out.clone(),
            colored: false,
        });
        assert_eq!(code, 0);
        assert!(out.join("Start.assembly").exists());
        assert!(out.join("Main.assembly").exists());
    }
}

//! A stand-in for external programs. The binary records its arguments and
//! environment next to itself and replays whatever exit status and output
//! the test scripted there.

use std::{
    error::Error,
    ffi::OsStr,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

fn exe_name(name: &str) -> String {
    format!("{}{}", name, std::env::consts::EXE_SUFFIX)
}

fn write_args(workdir: &Path) -> std::io::Result<()> {
    let mut file = File::create(workdir.join("args"))?;
    for arg in std::env::args().skip(1) {
        file.write_all(arg.as_bytes())?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn write_env(workdir: &Path) -> std::io::Result<()> {
    let mut file = File::create(workdir.join("env"))?;
    for (key, value) in std::env::vars() {
        file.write_all(key.as_bytes())?;
        file.write_all(b"=")?;
        file.write_all(value.as_bytes())?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn exit_status(workdir: &Path) -> Result<i32, Box<dyn Error>> {
    let exit_status = std::fs::read_to_string(workdir.join("exit-status"))?
        .trim()
        .parse()?;
    Ok(exit_status)
}

fn replay(workdir: &Path, name: &str, out: &mut impl Write) -> std::io::Result<()> {
    let mut file = File::open(workdir.join(name))?;
    std::io::copy(&mut file, out)?;
    Ok(())
}

pub fn recorder_main() {
    let workdir = match std::env::current_exe() {
        Ok(exe) => exe.parent().map(Path::to_owned).unwrap_or_default(),
        Err(_) => std::process::exit(127),
    };
    let _ = write_args(&workdir);
    let _ = write_env(&workdir);
    let _ = replay(&workdir, "stdout", &mut std::io::stdout());
    let _ = replay(&workdir, "stderr", &mut std::io::stderr());

    std::process::exit(exit_status(&workdir).unwrap_or(0));
}

/// A temporary directory holding a copy of the recorder binary.
pub struct Workdir {
    dir: tempfile::TempDir,
}

impl Workdir {
    const BINARY_NAME: &'static str = "recorder";

    pub fn new(recorder: impl AsRef<OsStr>) -> std::io::Result<Self> {
        let dir = tempfile::TempDir::new()?;
        std::fs::copy(
            Path::new(&recorder),
            dir.path().join(exe_name(Self::BINARY_NAME)),
        )?;
        Ok(Self { dir })
    }

    pub fn with_exit_status(self, exit_status: i32) -> std::io::Result<Self> {
        std::fs::write(self.path().join("exit-status"), exit_status.to_string())?;
        Ok(self)
    }

    pub fn with_stdout(self, stdout: impl AsRef<[u8]>) -> std::io::Result<Self> {
        std::fs::write(self.path().join("stdout"), stdout)?;
        Ok(self)
    }

    pub fn with_stderr(self, stderr: impl AsRef<[u8]>) -> std::io::Result<Self> {
        std::fs::write(self.path().join("stderr"), stderr)?;
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn bin(&self) -> PathBuf {
        self.dir.path().join(exe_name(Self::BINARY_NAME))
    }

    pub fn bin_str(&self) -> String {
        self.bin().to_string_lossy().into_owned()
    }

    pub fn args(&self) -> std::io::Result<Args> {
        let args = std::fs::read_to_string(self.path().join("args"))?
            .lines()
            .map(|s| s.to_owned())
            .collect();
        Ok(Args { args })
    }

    pub fn env(&self) -> std::io::Result<Env> {
        let env = std::fs::read_to_string(self.path().join("env"))?
            .lines()
            .filter_map(|s| s.split_once('='))
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        Ok(Env { env })
    }
}

pub struct Args {
    args: Vec<String>,
}

impl Args {
    pub fn assert_args(&self, args: &[impl AsRef<str>]) -> &Self {
        let args = args.iter().map(|s| s.as_ref()).collect::<Vec<_>>();
        assert_eq!(&self.args, &args);
        self
    }

    pub fn assert_not_contains(&self, needle: &str) -> &Self {
        assert!(
            !self.args.iter().any(|a| a.contains(needle)),
            "{:?} contains {:?}",
            self.args,
            needle
        );
        self
    }
}

pub struct Env {
    env: Vec<(String, String)>,
}

impl Env {
    pub fn assert_var(&self, key: impl AsRef<str>, value: impl AsRef<str>) -> &Self {
        let key = key.as_ref();
        let value = value.as_ref();
        assert!(
            self.env.iter().any(|(k, v)| k == key && v == value),
            "{}={} not set",
            key,
            value
        );
        self
    }
}

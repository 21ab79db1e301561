use crate::breakpoint;

const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(50);

/// Drives an external BGB executable.
#[derive(Clone, Debug)]
pub struct Bgb {
    pub path: std::path::PathBuf,
    /// Appended after the generated arguments, shell-split.
    pub extra_args: String,
    /// Arguments enabling video capture; `{output}` is replaced by the capture path.
    pub capture_args: String,
}

impl Bgb {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: path.into(),
            extra_args: String::new(),
            capture_args: String::new(),
        }
    }

    pub fn args(&self, req: &crate::RunRequest) -> Result<Vec<std::ffi::OsString>, crate::Error> {
        let mut args: Vec<std::ffi::OsString> = vec![
            "-rom".into(),
            req.input_save.into(),
            "-br".into(),
            breakpoint::join(req.breakpoints).into(),
            "-stateonexit".into(),
            staging_path(req.output_save).into(),
            "-nobatt".into(),
            "-nowriteini".into(),
        ];
        if let Some(demo) = req.demo {
            args.push("-demoplay".into());
            args.push(demo.into());
        }
        match req.capture {
            Some(capture) => {
                let output = capture.output_path.to_string_lossy();
                args.extend(
                    shell_words::split(&self.capture_args)?
                        .into_iter()
                        .map(|arg| std::ffi::OsString::from(arg.replace("{output}", &output))),
                );
            }
            None => {
                // Fast-forward headless when nothing is watching.
                args.push("-hf".into());
            }
        }
        args.extend(shell_words::split(&self.extra_args)?.into_iter().map(std::ffi::OsString::from));
        Ok(args)
    }
}

/// BGB writes its exit state here first. It only replaces the real output once the run has produced one, so an
/// output left over from an earlier run is never mistaken for a fresh one.
pub fn staging_path(output_save: &std::path::Path) -> std::path::PathBuf {
    let mut name = output_save.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    output_save.with_file_name(name)
}

fn remove_if_exists(path: &std::path::Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl crate::Emulator for Bgb {
    fn run(&self, req: &crate::RunRequest) -> Result<(), crate::Error> {
        let args = self.args(req)?;
        log::debug!("running {} {:?}", self.path.display(), args);

        let staging = staging_path(req.output_save);
        remove_if_exists(&staging)?;
        let started_at = std::time::Instant::now();
        let mut child = std::process::Command::new(&self.path)
            .args(&args)
            .stdin(std::process::Stdio::null())
            .spawn()
            .map_err(crate::Error::Spawn)?;

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if let Some(timeout) = req.timeout {
                if started_at.elapsed() >= timeout {
                    log::error!("emulator still running after {:?}, killing it", timeout);
                    child.kill()?;
                    child.wait()?;
                    return Err(crate::Error::Timeout(timeout));
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            return Err(crate::Error::Exited(status));
        }

        if !staging.is_file() {
            return Err(crate::Error::BreakpointNotReached(req.output_save.to_path_buf()));
        }
        std::fs::rename(&staging, req.output_save)?;

        log::debug!("emulator halted after {:?}", started_at.elapsed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Emulator as _;

    fn request<'a>(
        input: &'a std::path::Path,
        output: &'a std::path::Path,
        breakpoints: &'a [crate::Breakpoint],
    ) -> crate::RunRequest<'a> {
        crate::RunRequest {
            input_save: input,
            output_save: output,
            breakpoints,
            demo: None,
            capture: None,
            timeout: None,
        }
    }

    #[test]
    fn test_args() {
        let mut bgb = Bgb::new("bgb.exe");
        bgb.extra_args = "-setting 'Speed=1'".to_string();
        let breakpoints = [
            crate::Breakpoint::new("BattleMenu").unless_equal("TOTALCLKS", 0x10),
            crate::Breakpoint::new("LostBattle"),
        ];
        let mut req = request(
            std::path::Path::new("in.sna"),
            std::path::Path::new("out.sna"),
            &breakpoints,
        );
        let demo = std::path::PathBuf::from("out.dem");
        req.demo = Some(&demo);

        assert_eq!(
            bgb.args(&req).unwrap(),
            [
                "-rom",
                "in.sna",
                "-br",
                "BattleMenu/TOTALCLKS!=$10,LostBattle",
                "-stateonexit",
                "out.sna.part",
                "-nobatt",
                "-nowriteini",
                "-demoplay",
                "out.dem",
                "-hf",
                "-setting",
                "Speed=1",
            ]
            .iter()
            .map(std::ffi::OsString::from)
            .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_args_capture() {
        let mut bgb = Bgb::new("bgb.exe");
        bgb.capture_args = "-rec \"{output}\"".to_string();
        let capture = crate::Capture {
            output_path: std::path::PathBuf::from("movie 0.avi"),
        };
        let mut req = request(std::path::Path::new("in.sna"), std::path::Path::new("out.sna"), &[]);
        req.capture = Some(&capture);

        let args = bgb.args(&req).unwrap();
        assert!(!args.contains(&"-hf".into()));
        let expected: [std::ffi::OsString; 2] = ["-rec".into(), "movie 0.avi".into()];
        assert_eq!(&args[args.len() - 2..], &expected[..]);
    }

    #[cfg(unix)]
    fn script(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-bgb");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_run_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sna");
        let output = dir.path().join("out.sna");
        std::fs::write(&input, b"state").unwrap();

        // $2 is the input save, $6 where the exit state goes.
        let bgb = Bgb::new(script(dir.path(), "cp \"$2\" \"$6\""));
        bgb.run(&request(&input, &output, &[])).unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"state");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_breakpoint_not_reached() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sna");
        let output = dir.path().join("out.sna");
        std::fs::write(&input, b"state").unwrap();

        let bgb = Bgb::new(script(dir.path(), "exit 0"));
        assert!(matches!(
            bgb.run(&request(&input, &output, &[])),
            Err(crate::Error::BreakpointNotReached(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_same_input_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("battle.sna");
        std::fs::write(&save, b"before").unwrap();

        let bgb = Bgb::new(script(dir.path(), "printf after > \"$6\""));
        bgb.run(&request(&save, &save, &[])).unwrap();
        assert_eq!(std::fs::read(&save).unwrap(), b"after");
        assert!(!staging_path(&save).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_existing_output_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("out.sna");
        std::fs::write(&save, b"state").unwrap();
        // Left behind by an earlier, interrupted run.
        std::fs::write(staging_path(&save), b"stale").unwrap();

        let bgb = Bgb::new(script(dir.path(), "exit 0"));
        assert!(matches!(
            bgb.run(&request(&save, &save, &[])),
            Err(crate::Error::BreakpointNotReached(_))
        ));
        assert_eq!(std::fs::read(&save).unwrap(), b"state");
    }

    #[test]
    fn test_staging_path() {
        assert_eq!(
            staging_path(std::path::Path::new("saves/out.sna")),
            std::path::PathBuf::from("saves/out.sna.part")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sna");
        let bgb = Bgb::new(script(dir.path(), "exit 3"));
        assert!(matches!(
            bgb.run(&request(&input, &input, &[])),
            Err(crate::Error::Exited(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sna");
        let bgb = Bgb::new(script(dir.path(), "exec sleep 10"));
        let mut req = request(&input, &input, &[]);
        req.timeout = Some(std::time::Duration::from_millis(200));
        assert!(matches!(bgb.run(&req), Err(crate::Error::Timeout(_))));
    }

    #[test]
    fn test_run_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.sna");
        let bgb = Bgb::new(dir.path().join("does-not-exist"));
        assert!(matches!(
            bgb.run(&request(&input, &input, &[])),
            Err(crate::Error::Spawn(_))
        ));
    }
}

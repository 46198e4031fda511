//! Runs embedded `PostgreSQL` lifecycle steps on behalf of a root test run.
//!
//! ```text
//! pg_worker <setup|start|stop> <config-path>
//! ```
//!
//! `config-path` names a JSON [`WorkerPayload`] carrying the cluster
//! settings and environment overrides. When started as root the worker
//! re-executes itself as `nobody`, because `initdb` refuses to run as root.
//! Point `PG_EMBEDDED_WORKER` at this binary before running the `postgres`
//! integration tests as root.
//!
//! [`WorkerPayload`]: pg_embedded_setup_unpriv::worker::WorkerPayload

/// Boxed error returned from `main`.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    lifecycle::run().map_err(Into::into)
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker requires a Unix host".into())
}

#[cfg(unix)]
mod lifecycle {
    use super::BoxError;
    use camino::{Utf8Path, Utf8PathBuf};
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::ambient_dir_and_path;
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::env;
    use std::ffi::CString;
    use std::io::{self, Read};
    use std::mem::ManuallyDrop;
    use std::process::{Command, ExitStatus};
    use thiserror::Error;

    /// Marks the demoted child so it does not re-execute again.
    const DEMOTED_ENV: &str = "TASKBOARD_PG_WORKER_DEMOTED";
    const UNPRIVILEGED_USER: &str = "nobody";
    const TRUSTED_PATH: &str = "/usr/sbin:/usr/bin:/sbin:/bin";

    /// Failures while driving a lifecycle step.
    #[derive(Debug, Error)]
    pub enum LifecycleError {
        #[error("usage: {0}")]
        Usage(String),
        #[error("cannot read worker config: {0}")]
        ReadConfig(#[source] BoxError),
        #[error("cannot parse worker config: {0}")]
        ParseConfig(#[source] serde_json::Error),
        #[error("invalid cluster settings: {0}")]
        Settings(String),
        #[error("cannot start runtime: {0}")]
        Runtime(#[source] io::Error),
        #[error("cannot drop privileges: {0}")]
        Demote(String),
        #[error("postgres {step} failed: {reason}")]
        Postgres { step: &'static str, reason: String },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Setup,
        Start,
        Stop,
    }

    impl Step {
        const fn name(self) -> &'static str {
            match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            }
        }
    }

    impl std::str::FromStr for Step {
        type Err = LifecycleError;

        fn from_str(value: &str) -> Result<Self, Self::Err> {
            match value {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(LifecycleError::Usage(format!(
                    "unknown pg_worker operation '{other}'"
                ))),
            }
        }
    }

    pub fn run() -> Result<(), LifecycleError> {
        let args = utf8_args()?;
        if Uid::effective().is_root() && env::var_os(DEMOTED_ENV).is_none() {
            let status = reexec_unprivileged(&args)?;
            std::process::exit(status.code().unwrap_or(1));
        }

        let (step, config_path) = parse_args(&args)?;
        let payload = load_payload(&config_path)?;
        demote_if_root()?;
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| LifecycleError::Settings(err.to_string()))?;
        apply_environment(&payload.environment);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LifecycleError::Runtime)?;
        runtime.block_on(drive(step, PostgreSQL::new(settings)))
    }

    fn utf8_args() -> Result<Vec<Utf8PathBuf>, LifecycleError> {
        env::args_os()
            .map(|arg| {
                arg.into_string()
                    .map(Utf8PathBuf::from)
                    .map_err(|_| LifecycleError::Usage("argument is not valid UTF-8".to_owned()))
            })
            .collect()
    }

    fn parse_args(args: &[Utf8PathBuf]) -> Result<(Step, Utf8PathBuf), LifecycleError> {
        let mut rest = args.iter().skip(1);
        let step = rest
            .next()
            .ok_or_else(|| LifecycleError::Usage("missing operation argument".to_owned()))?
            .as_str()
            .parse()?;
        let config_path = rest
            .next()
            .ok_or_else(|| LifecycleError::Usage("missing config path argument".to_owned()))?
            .clone();
        if let Some(extra) = rest.next() {
            return Err(LifecycleError::Usage(format!("unexpected extra argument: {extra}")));
        }
        Ok((step, config_path))
    }

    fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, LifecycleError> {
        let bytes = read_file(path).map_err(LifecycleError::ReadConfig)?;
        serde_json::from_slice(&bytes).map_err(LifecycleError::ParseConfig)
    }

    fn read_file(path: &Utf8Path) -> Result<Vec<u8>, BoxError> {
        let (dir, relative) = ambient_dir_and_path(path)?;
        let mut file = dir.open(relative.as_std_path())?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    /// Runs the same command line again as the unprivileged user.
    fn reexec_unprivileged(args: &[Utf8PathBuf]) -> Result<ExitStatus, LifecycleError> {
        let exe = env::current_exe().map_err(LifecycleError::Runtime)?;
        let exe_path = Utf8PathBuf::try_from(exe)
            .map_err(|err| LifecycleError::Demote(format!("executable path: {err}")))?;
        let forwarded = args.iter().skip(1);

        let runuser = Command::new("runuser")
            .args(["-u", UNPRIVILEGED_USER, "--"])
            .arg(exe_path.as_std_path())
            .args(forwarded.clone().map(|arg| arg.as_std_path()))
            .env(DEMOTED_ENV, "1")
            .env("PATH", TRUSTED_PATH)
            .status();
        match runuser {
            Ok(status) => Ok(status),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let exe_arg = shell_escape(exe_path.as_str());
                let mut script = format!("{DEMOTED_ENV}=1 exec {exe_arg}");
                for arg in forwarded {
                    script.push(' ');
                    script.push_str(&shell_escape(arg.as_str()));
                }
                Command::new("/bin/su")
                    .args(["-s", "/bin/sh", UNPRIVILEGED_USER, "-c"])
                    .arg(script)
                    .env("PATH", TRUSTED_PATH)
                    .status()
                    .map_err(|su_err| LifecycleError::Demote(su_err.to_string()))
            }
            Err(err) => Err(LifecycleError::Demote(err.to_string())),
        }
    }

    fn demote_if_root() -> Result<(), LifecycleError> {
        if !Uid::effective().is_root() {
            return Ok(());
        }
        let demote = |err: nix::Error| LifecycleError::Demote(err.to_string());
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(demote)?
            .ok_or_else(|| LifecycleError::Demote(format!("user {UNPRIVILEGED_USER} not found")))?;
        let name = CString::new(user.name.clone())
            .map_err(|err| LifecycleError::Demote(err.to_string()))?;
        initgroups(&name, user.gid).map_err(demote)?;
        setgid(user.gid).map_err(demote)?;
        setuid(user.uid).map_err(demote)?;

        // SAFETY: no other threads exist yet; the runtime is built afterwards.
        unsafe {
            env::set_var("HOME", &user.dir);
            env::set_var("USER", &user.name);
            env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: still single-threaded; the runtime is built afterwards.
            unsafe {
                match value {
                    Some(secret) => env::set_var(key, secret.expose()),
                    None => env::remove_var(key),
                }
            }
        }
    }

    async fn drive(step: Step, mut postgres: PostgreSQL) -> Result<(), LifecycleError> {
        let failed = |err: postgresql_embedded::Error| LifecycleError::Postgres {
            step: step.name(),
            reason: err.to_string(),
        };
        match step {
            Step::Setup => {
                postgres.setup().await.map_err(failed)?;
                ensure_started(&mut postgres).await.map_err(failed)
            }
            Step::Start => {
                ensure_started(&mut postgres).await.map_err(failed)?;
                // Dropping the handle would stop the server this step started.
                let _running = ManuallyDrop::new(postgres);
                Ok(())
            }
            Step::Stop => postgres.stop().await.map_err(failed),
        }
    }

    async fn ensure_started(postgres: &mut PostgreSQL) -> postgresql_embedded::Result<()> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres.start().await
    }

    /// Quotes `value` for a POSIX shell using the `'\''` idiom.
    fn shell_escape(value: &str) -> String {
        format!("'{}'", value.replace('\'', "'\\''"))
    }

}

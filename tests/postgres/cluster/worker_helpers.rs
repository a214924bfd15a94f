//! Locates and stages the `pg_worker` binary for root test runs.

use super::BoxError;
use super::fs_utils::open_parent_dir;
use camino::{Utf8Path, Utf8PathBuf};
#[cfg(unix)]
use cap_std::fs::{Permissions, PermissionsExt};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::sync::{Mutex, OnceLock};

static WORKER_CACHE: OnceLock<Mutex<HashMap<Utf8PathBuf, Utf8PathBuf>>> = OnceLock::new();

pub(super) fn locate_pg_worker_path() -> Option<Utf8PathBuf> {
    crate::test_helpers::locate_pg_worker_path()
}

/// Copies `worker` into the temp directory behind a wrapper script that
/// drops to `nobody` under root, returning the wrapper path.
///
/// Repeated calls for the same source reuse the first wrapper.
pub(super) fn prepare_pg_worker(worker: &Utf8Path) -> Result<Utf8PathBuf, BoxError> {
    let cache = WORKER_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut staged = cache.lock().map_err(|err| {
        Box::new(std::io::Error::other(format!(
            "worker cache lock poisoned: {err}"
        ))) as BoxError
    })?;
    if let Some(path) = staged.get(worker) {
        return Ok(path.clone());
    }

    let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir()).map_err(|err| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("temp directory path is not valid UTF-8: {err}"),
        )) as BoxError
    })?;
    let mut hasher = DefaultHasher::new();
    worker.as_str().hash(&mut hasher);
    let wrapper_path = temp_dir.join(format!(
        "pg_worker_{pid}_{hash:x}",
        pid = std::process::id(),
        hash = hasher.finish(),
    ));
    let binary_path = wrapper_path.with_extension("bin");

    let (source_dir, source_name) = open_parent_dir(worker)?;
    let (wrapper_dir, wrapper_name) = open_parent_dir(&wrapper_path)?;
    let (binary_dir, binary_name) = open_parent_dir(&binary_path)?;
    remove_if_present(&wrapper_dir, wrapper_name)?;
    remove_if_present(&binary_dir, binary_name)?;

    source_dir
        .copy(source_name, &binary_dir, binary_name)
        .map_err(|err| Box::new(err) as BoxError)?;
    write_wrapper(&wrapper_dir, wrapper_name, &binary_path)?;

    #[cfg(unix)]
    for (dir, name) in [(&wrapper_dir, wrapper_name), (&binary_dir, binary_name)] {
        dir.set_permissions(name, Permissions::from_mode(0o755))
            .map_err(|err| Box::new(err) as BoxError)?;
    }

    staged.insert(worker.to_path_buf(), wrapper_path.clone());
    Ok(wrapper_path)
}

fn remove_if_present(dir: &cap_std::fs_utf8::Dir, name: &str) -> Result<(), BoxError> {
    match dir.remove_file(name) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Box::new(err) as BoxError),
    }
}

fn write_wrapper(
    dir: &cap_std::fs_utf8::Dir,
    name: &str,
    binary_path: &Utf8Path,
) -> Result<(), BoxError> {
    let script = format!(
        concat!(
            "#!/bin/sh\n",
            "if [ \"$(id -u)\" -eq 0 ]; then\n",
            "  exec /usr/sbin/runuser -u nobody -- {worker} \"$@\"\n",
            "fi\n",
            "exec {worker} \"$@\"\n",
        ),
        worker = binary_path.as_str()
    );
    let mut file = dir.create(name).map_err(|err| Box::new(err) as BoxError)?;
    file.write_all(script.as_bytes())
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Tests for `pg_worker` discovery and staging.

    use super::{locate_pg_worker_path, prepare_pg_worker};
    use crate::test_helpers::EnvVarGuard;
    use camino::{Utf8Path, Utf8PathBuf};
    use cap_std::ambient_authority;
    use cap_std::fs_utf8::Dir;
    use std::ffi::OsString;
    use std::io::Write;

    fn scratch_dir(prefix: &str) -> Utf8PathBuf {
        let base = Utf8PathBuf::try_from(std::env::temp_dir()).expect("temp dir is UTF-8");
        let name = format!("{prefix}_{}", uuid::Uuid::new_v4());
        Dir::open_ambient_dir(&base, ambient_authority())
            .expect("temp dir opens")
            .create_dir(&name)
            .expect("scratch dir created");
        base.join(name)
    }

    fn fake_worker(dir: &Utf8Path) -> Utf8PathBuf {
        let mut file = Dir::open_ambient_dir(dir, ambient_authority())
            .expect("scratch dir opens")
            .create("pg_worker")
            .expect("worker file created");
        file.write_all(b"#!/bin/sh\nexit 0\n").expect("worker written");
        dir.join("pg_worker")
    }

    #[test]
    fn runtime_worker_variable_wins_over_path() {
        let env_worker = fake_worker(&scratch_dir("pg_worker_env"));
        let path_dir = scratch_dir("pg_worker_path");
        fake_worker(&path_dir);

        let guard = EnvVarGuard::set_many(&[
            (
                OsString::from("CARGO_BIN_EXE_pg_worker"),
                Some(OsString::from(env_worker.as_str())),
            ),
            (OsString::from("PATH"), Some(OsString::from(path_dir.as_str()))),
            (OsString::from("PG_EMBEDDED_WORKER"), None),
        ]);
        let located = locate_pg_worker_path();
        drop(guard);

        assert_eq!(located, Some(env_worker));
    }

    #[test]
    fn staging_the_same_worker_twice_reuses_the_wrapper() {
        let worker = fake_worker(&scratch_dir("pg_worker_source"));

        let first = prepare_pg_worker(&worker).expect("worker staged");
        let second = prepare_pg_worker(&worker).expect("worker staged");

        assert_eq!(first, second);
        assert!(first.is_file());
    }
}

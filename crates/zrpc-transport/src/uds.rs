//! Filesystem-path Unix domain sockets.

use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::RpcStream;

/// Mode given to socket files we create.
pub const SOCKET_MODE: u32 = 0o600;

// sockaddr_un.sun_path, including the trailing NUL.
#[cfg(target_os = "linux")]
const SUN_PATH_MAX: usize = 108;
#[cfg(not(target_os = "linux"))]
const SUN_PATH_MAX: usize = 104;

pub(crate) struct UnixBinding {
    listener: UnixListener,
    file: SocketFile,
}

/// The socket file a binding created. Removed on drop, but only while the
/// path still refers to that same file.
struct SocketFile {
    path: PathBuf,
    dev: u64,
    ino: u64,
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        match std::fs::symlink_metadata(&self.path) {
            Ok(meta)
                if meta.file_type().is_socket()
                    && meta.dev() == self.dev
                    && meta.ino() == self.ino =>
            {
                debug!(path = ?self.path, "removing socket file");
                let _ = std::fs::remove_file(&self.path);
            }
            Ok(_) => debug!(path = ?self.path, "socket path was replaced; leaving it"),
            Err(_) => {}
        }
    }
}

fn bind_error(path: &Path, source: io::Error) -> TransportError {
    TransportError::Bind {
        address: path.display().to_string(),
        source,
    }
}

/// Remove a socket file left behind by a previous process. Anything that is
/// not a socket is an error.
fn clear_stale(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(bind_error(path, err)),
    };
    if !meta.file_type().is_socket() {
        return Err(bind_error(
            path,
            io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a socket"),
        ));
    }
    debug!(?path, "removing stale socket");
    std::fs::remove_file(path).map_err(|e| bind_error(path, e))
}

pub(crate) fn bind(path: &Path) -> Result<UnixBinding> {
    let len = path.as_os_str().len();
    if len >= SUN_PATH_MAX {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: SUN_PATH_MAX,
        });
    }
    clear_stale(path)?;

    let listener = UnixListener::bind(path).map_err(|e| bind_error(path, e))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(SOCKET_MODE))
        .map_err(|e| bind_error(path, e))?;
    let meta = std::fs::symlink_metadata(path).map_err(|e| bind_error(path, e))?;
    info!(?path, "listening on unix socket");

    Ok(UnixBinding {
        listener,
        file: SocketFile {
            path: path.to_path_buf(),
            dev: meta.dev(),
            ino: meta.ino(),
        },
    })
}

pub(crate) fn connect(path: &Path) -> Result<RpcStream> {
    let stream = UnixStream::connect(path).map_err(|source| TransportError::Connect {
        address: path.display().to_string(),
        source,
    })?;
    debug!(?path, "connected over unix socket");
    Ok(RpcStream::from(stream))
}

impl UnixBinding {
    pub(crate) fn accept(&self) -> Result<RpcStream> {
        let (stream, _) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.file.path, "accepted unix connection");
        Ok(RpcStream::from(stream))
    }

    pub(crate) fn path(&self) -> &Path {
        &self.file.path
    }
}

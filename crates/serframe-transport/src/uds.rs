use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::{StreamSink, StreamSource};
use crate::traits::Device;

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// A serial line carried over a connected Unix domain socket.
///
/// Emulators expose guest UARTs this way, e.g. QEMU with
/// `-serial unix:/tmp/uart.sock,server`.
#[derive(Debug)]
pub struct UnixSerial {
    stream: UnixStream,
    name: String,
}

impl UnixSerial {
    /// Connect to a device that is listening on `path`.
    pub fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_path_len(path)?;
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(?path, "connected to serial socket");
        Ok(Self::from_stream(stream, path.display().to_string()))
    }

    fn from_stream(stream: UnixStream, name: String) -> Self {
        Self { stream, name }
    }

    /// Split into a receive source and a transmit sink sharing the socket.
    pub fn split(self) -> Result<(StreamSource<UnixStream>, StreamSink<UnixStream>)> {
        let rx = self.stream.try_clone()?;
        Ok((
            StreamSource::new(self.name.clone(), rx),
            StreamSink::new(self.name, self.stream),
        ))
    }
}

impl Device for UnixSerial {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        matches!(self.stream.take_error(), Ok(None)) && self.stream.peer_addr().is_ok()
    }
}

/// Waits for a serial device to connect on a filesystem-path socket.
///
/// Used when the device side is the client (e.g. QEMU
/// `-serial unix:/tmp/uart.sock` without `server`).
pub struct UnixSerialListener {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
}

impl UnixSerialListener {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// Bind on `path`, replacing a stale socket left by a previous run.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        // Never remove non-socket files.
        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(bind_err)?;
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(
            &path,
            std::fs::Permissions::from_mode(Self::DEFAULT_SOCKET_MODE),
        )
        .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "waiting for serial device");
        Ok(Self {
            listener,
            created_inode: Some((created.dev(), created.ino())),
            path,
        })
    }

    /// Accept the device connection (blocking).
    pub fn accept(&self) -> Result<UnixSerial> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "serial device connected");
        Ok(UnixSerial::from_stream(
            stream,
            self.path.display().to_string(),
        ))
    }

    /// The path this listener is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixSerialListener {
    fn drop(&mut self) {
        let Some((dev, ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket() && metadata.dev() == dev && metadata.ino() == ino {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    use super::*;
    use crate::traits::{ByteSink, ByteSource};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("serframe-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn listener_accepts_device_and_splits() {
        let dir = temp_dir("uds-accept");
        let sock_path = dir.join("uart.sock");
        let listener = UnixSerialListener::bind(&sock_path).unwrap();

        let path_clone = sock_path.clone();
        let device = std::thread::spawn(move || {
            let mut uart = UnixStream::connect(&path_clone).unwrap();
            uart.write_all(b"ping\n").unwrap();
            let mut reply = [0u8; 4];
            uart.read_exact(&mut reply).unwrap();
            reply
        });

        let serial = listener.accept().unwrap();
        assert!(serial.is_ready());
        let (source, mut sink) = serial.split().unwrap();

        let (tx, rx) = mpsc::channel::<Vec<u8>>();
        let _rx_thread = source
            .start(Box::new(move |bytes: &[u8]| {
                let _ = tx.send(bytes.to_vec());
            }))
            .unwrap();

        let mut received = Vec::new();
        while received.len() < 5 {
            received.extend(rx.recv().unwrap());
        }
        assert_eq!(received, b"ping\n");

        sink.put_bytes(b"pong").unwrap();
        assert_eq!(&device.join().unwrap(), b"pong");

        drop(listener);
        assert!(!sock_path.exists(), "socket file should be cleaned up on drop");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn connect_to_listening_device() {
        let dir = temp_dir("uds-connect");
        let sock_path = dir.join("qemu.sock");
        let device = UnixListener::bind(&sock_path).unwrap();

        let serial = UnixSerial::connect(&sock_path).unwrap();
        let (mut peer, _) = device.accept().unwrap();
        assert_eq!(serial.name(), sock_path.display().to_string());
        assert!(serial.is_ready());

        let (_source, mut sink) = serial.split().unwrap();
        sink.put_byte(b'!').unwrap();
        let mut buf = [0u8; 1];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"!");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn connect_to_missing_device_fails() {
        let dir = temp_dir("uds-missing");
        let err = UnixSerial::connect(dir.join("absent.sock")).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_too_long_is_rejected() {
        let long_path = "/tmp/".to_string() + &"a".repeat(200) + ".sock";
        assert!(matches!(
            UnixSerialListener::bind(&long_path),
            Err(TransportError::PathTooLong { .. })
        ));
        assert!(matches!(
            UnixSerial::connect(&long_path),
            Err(TransportError::PathTooLong { .. })
        ));
    }

    #[test]
    fn bind_hardens_permissions() {
        let dir = temp_dir("uds-perms");
        let sock_path = dir.join("perm.sock");

        let listener = UnixSerialListener::bind(&sock_path).unwrap();
        let mode = std::fs::metadata(&sock_path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn bind_rejects_existing_regular_file() {
        let dir = temp_dir("uds-regular");
        let sock_path = dir.join("not-a-socket.sock");
        std::fs::write(&sock_path, b"regular-file").unwrap();

        let result = UnixSerialListener::bind(&sock_path);
        assert!(matches!(result, Err(TransportError::Bind { .. })));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

//! Feeding a script to a child process and collecting its output under a deadline.

use std::io::{self, Read, Write};
use std::process::Child;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Everything a finished (or killed) child wrote.
#[derive(Debug)]
pub(crate) struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Writes `input` to the child's stdin, then waits for it to exit.
///
/// The pipes are serviced on their own threads, so a child that fills its
/// stdout before reading all of stdin cannot stall the deadline check. On
/// timeout the child is killed and whatever it wrote is still drained.
pub(crate) fn communicate(mut child: Child, input: &str, timeout: Duration) -> io::Result<Captured> {
    let writer = child.stdin.take().map(|mut pipe| {
        let input = input.to_owned();
        thread::spawn(move || match pipe.write_all(input.as_bytes()) {
            // the child quit without reading everything; its output says why
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        })
    });
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started_at = Instant::now();
    let timed_out = loop {
        match child.try_wait() {
            Ok(Some(_)) => break false,
            Ok(None) => {}
            Err(e) => {
                reap(&mut child);
                return Err(e);
            }
        }
        if started_at.elapsed() >= timeout {
            // the child may exit on its own between the check and the kill
            let _ = child.kill();
            child.wait()?;
            break true;
        }
        thread::sleep(POLL_INTERVAL);
    };

    if let Some(writer) = writer {
        join(writer)?;
    }
    let stdout = stdout.map(join).transpose()?.unwrap_or_default();
    let stderr = stderr.map(join).transpose()?.unwrap_or_default();

    Ok(Captured {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
        elapsed: started_at.elapsed(),
    })
}

/// Kills the child and waits for it, so its pipes close and no zombie is left.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join<T>(handle: JoinHandle<io::Result<T>>) -> io::Result<T> {
    handle
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "interpreter pipe thread panicked"))?
}

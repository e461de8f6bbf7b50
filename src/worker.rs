use crate::compression::{
    decode_with_progress, encode_lossless_with_progress, encode_lossy_with, BlockQuantizer,
    CompressionError, DecompressionError, PaletteOracle,
};
use image::RgbImage;
use log::debug;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Sends progress fractions from a worker to its caller. Sending never blocks
/// and is silently dropped if the caller is gone.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<f32>,
}

impl ProgressSender {
    pub fn report(&self, fraction: f32) {
        let _ = self.tx.send(fraction);
    }
}

/// A job running on its own thread. Its result is published exactly once,
/// when the job completes.
#[derive(Debug)]
pub struct Task<T> {
    progress: Receiver<f32>,
    result: Receiver<T>,
    handle: Option<JoinHandle<()>>,
    last_progress: f32,
}

/// Why a task has no result to hand over.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// The job panicked before publishing its result.
    #[error("worker panicked")]
    Panicked,
}

impl<T> Task<T> {
    /// Drains the progress reports received so far and returns the latest one.
    pub fn progress(&mut self) -> f32 {
        while let Ok(fraction) = self.progress.try_recv() {
            self.last_progress = fraction;
        }
        self.last_progress
    }

    /// Returns the result if the job has completed, without blocking.
    pub fn try_result(&mut self) -> Option<Result<T, TaskError>> {
        match self.result.try_recv() {
            Ok(result) => {
                self.join();
                Some(Ok(result))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(TaskError::Panicked))
            }
        }
    }

    /// Blocks until the job completes and returns its result.
    pub fn wait(mut self) -> Result<T, TaskError> {
        let result = self.result.recv().map_err(|_| TaskError::Panicked);
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Runs `job` on a dedicated thread.
pub fn spawn<T, F>(job: F) -> Task<T>
where
    T: Send + 'static,
    F: FnOnce(ProgressSender) -> T + Send + 'static,
{
    let (progress_tx, progress_rx) = mpsc::channel();
    let (result_tx, result_rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let result = job(ProgressSender { tx: progress_tx });
        let _ = result_tx.send(result);
    });
    debug!("spawned worker {:?}", handle.thread().id());

    Task {
        progress: progress_rx,
        result: result_rx,
        handle: Some(handle),
        last_progress: 0.0,
    }
}

pub fn spawn_encode_lossless<O>(
    image: RgbImage,
    oracle: O,
) -> Task<Result<Vec<u8>, CompressionError>>
where
    O: PaletteOracle + Send + 'static,
{
    spawn(move |progress| {
        encode_lossless_with_progress(&image, &oracle, |fraction| progress.report(fraction))
    })
}

pub fn spawn_encode_lossy(image: RgbImage) -> Task<Result<Vec<u8>, CompressionError>> {
    spawn(move |progress| {
        encode_lossy_with(&image, &BlockQuantizer::default(), |fraction| {
            progress.report(fraction)
        })
    })
}

pub fn spawn_decode(data: Vec<u8>) -> Task<Result<RgbImage, DecompressionError>> {
    spawn(move |progress| decode_with_progress(&data, |fraction| progress.report(fraction)))
}

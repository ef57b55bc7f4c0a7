use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    U8,
    F32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatData {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

impl MatData {
    pub fn depth(&self) -> Depth {
        match self {
            MatData::U8(_) => Depth::U8,
            MatData::F32(_) => Depth::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MatData::U8(v) => v.len(),
            MatData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps an engine's live-buffer count up to date for as long as a `Mat`
/// exists.
#[derive(Debug)]
pub(crate) struct Lease(Arc<AtomicUsize>);

impl Lease {
    pub(crate) fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Lease(Arc::clone(counter))
    }
}

impl Clone for Lease {
    fn clone(&self) -> Self {
        Lease::new(&self.0)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Row-major, channel-interleaved numeric buffer.
#[derive(Debug, Clone)]
pub struct Mat {
    rows: usize,
    cols: usize,
    channels: usize,
    data: MatData,
    lease: Option<Lease>,
}

impl Mat {
    pub fn new(rows: usize, cols: usize, channels: usize, data: MatData) -> Result<Self> {
        let expected = rows * cols * channels;
        if data.len() != expected {
            return Err(Error::Engine(format!(
                "{}x{}x{} mat needs {} elements, got {}",
                rows,
                cols,
                channels,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            channels,
            data,
            lease: None,
        })
    }

    /// Skips the length check for buffers whose size follows from construction.
    pub(crate) fn from_parts(rows: usize, cols: usize, channels: usize, data: MatData) -> Self {
        debug_assert_eq!(data.len(), rows * cols * channels);
        Self {
            rows,
            cols,
            channels,
            data,
            lease: None,
        }
    }

    pub(crate) fn leased(mut self, counter: &Arc<AtomicUsize>) -> Self {
        self.lease = Some(Lease::new(counter));
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn depth(&self) -> Depth {
        self.data.depth()
    }

    pub fn data(&self) -> &MatData {
        &self.data
    }

    pub fn same_shape(&self, other: &Mat) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.channels == other.channels
    }

    pub fn as_u8(&self) -> Result<&[u8]> {
        match &self.data {
            MatData::U8(v) => Ok(v),
            MatData::F32(_) => Err(Error::Engine("expected an 8-bit mat".to_string())),
        }
    }
}

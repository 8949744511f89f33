//! Element loops over disjoint output chunks.
//!
//! With the `parallel` feature the chunks are processed by rayon, otherwise
//! sequentially. Callers must only write to the chunk they are handed.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Call `f(k, chunk)` for every `chunk_size` chunk of `out`.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_element<F>(out: &mut [f64], chunk_size: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    out.par_chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(k, chunk)| f(k, chunk));
}

/// Call `f(k, chunk)` for every `chunk_size` chunk of `out`.
#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_element<F>(out: &mut [f64], chunk_size: usize, f: F)
where
    F: Fn(usize, &mut [f64]) + Send + Sync,
{
    out.chunks_mut(chunk_size)
        .enumerate()
        .for_each(|(k, chunk)| f(k, chunk));
}

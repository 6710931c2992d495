//! The array pool: a process-wide vector of fixed-length integer arrays.
//!
//! Every variable of array type resolves to a stable [`ArrayHandle`] into
//! this pool rather than owning its storage directly, mirroring how the
//! evaluator never moves an array's backing cells once allocated.

use crate::eval::error::EvalError;

pub type ArrayHandle = usize;

/// A single fixed-length array, tagged with the frame-stack depth it was
/// created at. The depth is recorded but never consulted — see
/// [`ArrayPool`]'s docs.
pub struct Array {
    pub scope: usize,
    cells: Vec<i32>,
}

/// Owns every array ever allocated during a run. Handles are stable: once
/// issued, an index always refers to the same array for the rest of the
/// run. Arrays are never reclaimed, even once the frame that created them
/// is popped — `scope` is kept on each [`Array`] so that a future revision
/// could free them, but nothing currently reads it for that purpose.
#[derive(Default)]
pub struct ArrayPool {
    arrays: Vec<Array>,
}

impl ArrayPool {
    pub fn new() -> Self {
        ArrayPool::default()
    }

    pub fn alloc(&mut self, size: usize, scope: usize) -> ArrayHandle {
        let handle = self.arrays.len();
        self.arrays.push(Array {
            scope,
            cells: vec![0; size],
        });
        handle
    }

    pub fn get(&self, handle: ArrayHandle, index: i32) -> Result<i32, EvalError> {
        let arr = self.array(handle)?;
        Ok(arr.cells[Self::bounds_check(arr, index)?])
    }

    pub fn set(&mut self, handle: ArrayHandle, index: i32, value: i32) -> Result<(), EvalError> {
        let arr = self.array(handle)?;
        let idx = Self::bounds_check(arr, index)?;
        self.arrays[handle].cells[idx] = value;
        Ok(())
    }

    fn array(&self, handle: ArrayHandle) -> Result<&Array, EvalError> {
        self.arrays
            .get(handle)
            .ok_or(EvalError::UndefinedArrayHandle(handle))
    }

    fn bounds_check(arr: &Array, index: i32) -> Result<usize, EvalError> {
        if index < 0 || index as usize >= arr.cells.len() {
            return Err(EvalError::ArrayIndexOutOfRange {
                index,
                len: arr.cells.len(),
            });
        }
        Ok(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut pool = ArrayPool::new();
        let h = pool.alloc(10, 0);
        pool.set(h, 7, 49).unwrap();
        assert_eq!(pool.get(h, 7).unwrap(), 49);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut pool = ArrayPool::new();
        let h = pool.alloc(3, 0);
        assert!(pool.get(h, 3).is_err());
        assert!(pool.get(h, -1).is_err());
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let pool = ArrayPool::new();
        assert!(pool.get(0, 0).is_err());
    }
}

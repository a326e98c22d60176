//! Order book infrastructure module

pub mod four_heap;

pub use four_heap::FourHeap;

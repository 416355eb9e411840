//! Byte-addressable memory for the interpreter
//!
//! This module provides the store the driver allocates variables in and
//! the typed access functions the stepper reads through:
//! - [`value`]: tagged runtime values ([`Value`] and friends)
//! - [`ops`]: the primitive evaluators (arithmetic, casts, pointer math)
//! - [`Memory`]: block-based storage with bounds checks and per-byte
//!   initialization tracking
//!
//! # Typed Access
//!
//! [`read_value`] and [`write_value`] translate between tagged values and
//! raw little-endian bytes. The encoding is chosen by the pointer's
//! pointee type, so a read through an `int*` always yields an `int` value
//! regardless of what was last stored at the address.
//!
//! # Initialization Tracking
//!
//! Every byte remembers whether it has been written. Reading an
//! uninitialized byte is an error, which surfaces reads of uninitialized
//! variables, a common source of undefined behavior in C.

pub mod ops;
pub mod value;

use crate::types::{ScalarKind, Type};
use rustc_hash::FxHashMap;
use std::fmt;
use value::{Address, FloatingValue, IntegralValue, PointerValue, Value};

/// Lowest valid address; everything below acts as a null guard page
const FIRST_ADDRESS: Address = 0x100;

/// Memory access failures
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryError {
    /// Access through a null (or guard-page) pointer
    NullAccess { address: Address },

    /// Address not inside any allocated block
    Unallocated { address: Address },

    /// Access runs past the end of its block
    OutOfBounds { address: Address, size: usize },

    /// Read of bytes never written
    UninitializedRead { address: Address },

    /// The pointee type has no byte encoding (void, array, function)
    Unrepresentable { ty: String },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::NullAccess { address } => {
                write!(f, "null pointer access at 0x{:x}", address)
            }
            MemoryError::Unallocated { address } => {
                write!(f, "address 0x{:x} is not allocated", address)
            }
            MemoryError::OutOfBounds { address, size } => {
                write!(
                    f,
                    "access of {} bytes at 0x{:x} runs past its block",
                    size, address
                )
            }
            MemoryError::UninitializedRead { address } => {
                write!(f, "read of uninitialized memory at 0x{:x}", address)
            }
            MemoryError::Unrepresentable { ty } => {
                write!(f, "type {} has no byte encoding", ty)
            }
        }
    }
}

impl std::error::Error for MemoryError {}

/// A contiguous allocation
#[derive(Debug, Clone)]
struct Block {
    data: Vec<u8>,
    init: Vec<bool>,
}

impl Block {
    fn new(size: usize) -> Self {
        Block {
            data: vec![0; size],
            init: vec![false; size],
        }
    }
}

/// The byte-addressable store
#[derive(Debug, Clone, Default)]
pub struct Memory {
    blocks: FxHashMap<Address, Block>,
    next_address: Address,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            blocks: FxHashMap::default(),
            next_address: FIRST_ADDRESS,
        }
    }

    /// Allocate a fresh block and return its base address. Zero-sized
    /// requests still get a distinct address.
    pub fn allocate(&mut self, size: usize) -> Address {
        let address = self.next_address.max(FIRST_ADDRESS);
        let reserved = size.max(1);
        self.blocks.insert(address, Block::new(reserved));
        self.next_address = address + reserved as Address;
        address
    }

    /// Find the block containing `address`
    fn locate(&self, address: Address, size: usize) -> Result<(Address, &Block), MemoryError> {
        if address < FIRST_ADDRESS {
            return Err(MemoryError::NullAccess { address });
        }
        for (&base, block) in &self.blocks {
            if address >= base && address < base + block.data.len() as Address {
                if (address - base) as usize + size > block.data.len() {
                    return Err(MemoryError::OutOfBounds { address, size });
                }
                return Ok((base, block));
            }
        }
        Err(MemoryError::Unallocated { address })
    }

    /// Read `size` bytes, requiring every byte to be initialized
    pub fn read_bytes(&self, address: Address, size: usize) -> Result<&[u8], MemoryError> {
        let (base, block) = self.locate(address, size)?;
        let offset = (address - base) as usize;
        if !block.init[offset..offset + size].iter().all(|&b| b) {
            return Err(MemoryError::UninitializedRead { address });
        }
        Ok(&block.data[offset..offset + size])
    }

    /// Write bytes, marking them initialized
    pub fn write_bytes(&mut self, address: Address, bytes: &[u8]) -> Result<(), MemoryError> {
        if address < FIRST_ADDRESS {
            return Err(MemoryError::NullAccess { address });
        }
        let size = bytes.len();
        let base = self
            .blocks
            .iter()
            .find(|(&base, block)| {
                address >= base && address < base + block.data.len() as Address
            })
            .map(|(&base, _)| base)
            .ok_or(MemoryError::Unallocated { address })?;
        let block = self.blocks.get_mut(&base).expect("block just located");
        let offset = (address - base) as usize;
        if offset + size > block.data.len() {
            return Err(MemoryError::OutOfBounds { address, size });
        }
        block.data[offset..offset + size].copy_from_slice(bytes);
        for flag in &mut block.init[offset..offset + size] {
            *flag = true;
        }
        Ok(())
    }
}

/// Read a typed value through a pointer. The pointee type selects the
/// encoding and the resulting value's type.
pub fn read_value(memory: &Memory, ptr: &PointerValue) -> Result<Value, MemoryError> {
    let pointee = ptr.ty.pointee().ok_or_else(|| MemoryError::Unrepresentable {
        ty: format!("{:?}", ptr.ty),
    })?;
    match pointee {
        Type::Scalar(kind) if kind.is_integral() => {
            let bytes = memory.read_bytes(ptr.address, kind.size())?;
            let number = decode_integral(*kind, bytes);
            Ok(Value::Integral(IntegralValue::new(pointee.clone(), number)))
        }
        Type::Scalar(ScalarKind::Float) => {
            let bytes = memory.read_bytes(ptr.address, 4)?;
            let number = f32::from_le_bytes(bytes.try_into().expect("4-byte read")) as f64;
            Ok(Value::Floating(FloatingValue::new(pointee.clone(), number)))
        }
        Type::Scalar(ScalarKind::Double) => {
            let bytes = memory.read_bytes(ptr.address, 8)?;
            let number = f64::from_le_bytes(bytes.try_into().expect("8-byte read"));
            Ok(Value::Floating(FloatingValue::new(pointee.clone(), number)))
        }
        Type::Pointer(_) => {
            let bytes = memory.read_bytes(ptr.address, 8)?;
            let address = u64::from_le_bytes(bytes.try_into().expect("8-byte read"));
            Ok(Value::Pointer(PointerValue::new(pointee.clone(), address)))
        }
        other => Err(MemoryError::Unrepresentable {
            ty: format!("{:?}", other),
        }),
    }
}

/// Write a typed value through a pointer, converting to the pointee's
/// representation (an `int` stored through a `char*` wraps, as a C store
/// would).
pub fn write_value(
    memory: &mut Memory,
    ptr: &PointerValue,
    value: &Value,
) -> Result<(), MemoryError> {
    let pointee = ptr.ty.pointee().ok_or_else(|| MemoryError::Unrepresentable {
        ty: format!("{:?}", ptr.ty),
    })?;
    let unrepresentable = || MemoryError::Unrepresentable {
        ty: format!("{:?}", pointee),
    };
    match pointee {
        Type::Scalar(kind) if kind.is_integral() => {
            let number = match value {
                Value::Integral(v) => v.number,
                Value::Floating(v) => v.number as i64,
                Value::Pointer(p) => p.address as i64,
                _ => return Err(unrepresentable()),
            };
            let normalized = IntegralValue::new(pointee.clone(), number);
            memory.write_bytes(
                ptr.address,
                &normalized.number.to_le_bytes()[..kind.size()],
            )
        }
        Type::Scalar(ScalarKind::Float) => {
            let number = match value {
                Value::Integral(v) => v.number as f64,
                Value::Floating(v) => v.number,
                _ => return Err(unrepresentable()),
            };
            memory.write_bytes(ptr.address, &(number as f32).to_le_bytes())
        }
        Type::Scalar(ScalarKind::Double) => {
            let number = match value {
                Value::Integral(v) => v.number as f64,
                Value::Floating(v) => v.number,
                _ => return Err(unrepresentable()),
            };
            memory.write_bytes(ptr.address, &number.to_le_bytes())
        }
        Type::Pointer(_) => {
            let address = match value {
                Value::Pointer(p) => p.address,
                Value::Integral(v) => v.number as u64,
                _ => return Err(unrepresentable()),
            };
            memory.write_bytes(ptr.address, &address.to_le_bytes())
        }
        _ => Err(unrepresentable()),
    }
}

fn decode_integral(kind: ScalarKind, bytes: &[u8]) -> i64 {
    match kind {
        ScalarKind::Char => bytes[0] as i8 as i64,
        ScalarKind::UnsignedChar => bytes[0] as i64,
        ScalarKind::Short => i16::from_le_bytes(bytes.try_into().expect("2-byte read")) as i64,
        ScalarKind::UnsignedShort => {
            u16::from_le_bytes(bytes.try_into().expect("2-byte read")) as i64
        }
        ScalarKind::Int => i32::from_le_bytes(bytes.try_into().expect("4-byte read")) as i64,
        ScalarKind::UnsignedInt => {
            u32::from_le_bytes(bytes.try_into().expect("4-byte read")) as i64
        }
        ScalarKind::Long | ScalarKind::UnsignedLong => {
            i64::from_le_bytes(bytes.try_into().expect("8-byte read"))
        }
        _ => 0,
    }
}

//! Per-document ordinal storage
//!
//! Ordinals are stored shifted by one so that zero means "no value". The
//! overhead ratio decides how much space may be traded for speed: the
//! minimal bit width is rounded up to an aligned 8/16/32-bit slot whenever
//! `bits * (1 + ratio)` covers it, otherwise values stay bit-packed.

use std::fmt;
use std::mem;

use super::ram::RamUsage;

/// Packed array of `ord + 1` values, zero meaning missing
#[derive(Clone)]
pub enum PackedOrds {
    U8(Box<[u8]>),
    U16(Box<[u16]>),
    U32(Box<[u32]>),
    Packed {
        bits: u32,
        len: usize,
        words: Box<[u64]>,
    },
}

/// Number of bits needed to represent `max`, at least one
pub fn bits_required(max: u32) -> u32 {
    if max == 0 {
        1
    } else {
        32 - max.leading_zeros()
    }
}

impl PackedOrds {
    /// Pack `values` choosing the slot width from `overhead_ratio`
    pub fn from_values(values: &[u32], overhead_ratio: f32) -> Self {
        let max = values.iter().copied().max().unwrap_or(0);
        let bits = bits_required(max);
        let ratio = if overhead_ratio.is_finite() {
            overhead_ratio.max(0.0)
        } else {
            0.0
        };
        let max_bits = bits + (bits as f32 * ratio).floor() as u32;

        if bits <= 8 && max_bits >= 8 {
            PackedOrds::U8(values.iter().map(|&v| v as u8).collect())
        } else if bits <= 16 && max_bits >= 16 {
            PackedOrds::U16(values.iter().map(|&v| v as u16).collect())
        } else if bits == 32 || (bits <= 32 && max_bits >= 32) {
            PackedOrds::U32(values.into())
        } else {
            Self::bit_packed(values, bits)
        }
    }

    fn bit_packed(values: &[u32], bits: u32) -> Self {
        let total_bits = values.len() as u64 * bits as u64;
        let mut words = vec![0u64; ((total_bits + 63) / 64) as usize];

        for (i, &value) in values.iter().enumerate() {
            let bit_pos = i as u64 * bits as u64;
            let word = (bit_pos / 64) as usize;
            let offset = (bit_pos % 64) as u32;
            let value = value as u64;

            words[word] |= value << offset;
            if offset + bits > 64 {
                words[word + 1] |= value >> (64 - offset);
            }
        }

        PackedOrds::Packed {
            bits,
            len: values.len(),
            words: words.into_boxed_slice(),
        }
    }

    /// Stored value at `index`, zero when out of range
    pub fn get(&self, index: usize) -> u32 {
        match self {
            PackedOrds::U8(v) => v.get(index).map_or(0, |&x| x as u32),
            PackedOrds::U16(v) => v.get(index).map_or(0, |&x| x as u32),
            PackedOrds::U32(v) => v.get(index).copied().unwrap_or(0),
            PackedOrds::Packed { bits, len, words } => {
                if index >= *len {
                    return 0;
                }
                let bits = *bits;
                let mask = (1u64 << bits) - 1;
                let bit_pos = index as u64 * bits as u64;
                let word = (bit_pos / 64) as usize;
                let offset = (bit_pos % 64) as u32;

                let mut value = words[word] >> offset;
                if offset + bits > 64 {
                    value |= words[word + 1] << (64 - offset);
                }
                (value & mask) as u32
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PackedOrds::U8(v) => v.len(),
            PackedOrds::U16(v) => v.len(),
            PackedOrds::U32(v) => v.len(),
            PackedOrds::Packed { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bits per stored value
    pub fn bits_per_value(&self) -> u32 {
        match self {
            PackedOrds::U8(_) => 8,
            PackedOrds::U16(_) => 16,
            PackedOrds::U32(_) => 32,
            PackedOrds::Packed { bits, .. } => *bits,
        }
    }
}

impl RamUsage for PackedOrds {
    fn ram_bytes_used(&self) -> usize {
        mem::size_of::<Self>()
            + match self {
                PackedOrds::U8(v) => v.ram_bytes_used(),
                PackedOrds::U16(v) => v.ram_bytes_used(),
                PackedOrds::U32(v) => v.ram_bytes_used(),
                PackedOrds::Packed { words, .. } => words.ram_bytes_used(),
            }
    }
}

impl fmt::Debug for PackedOrds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedOrds")
            .field("len", &self.len())
            .field("bits_per_value", &self.bits_per_value())
            .finish()
    }
}

#![allow(non_upper_case_globals)]

pub use ::half::{bf16, f16};

pub const bfloat16: DType = DType::BF16;
pub const float16: DType = DType::F16;
pub const half: DType = DType::F16;
pub const float32: DType = DType::F32;
pub const float64: DType = DType::F64;
pub const bool: DType = DType::BOOL;
pub const uint8: DType = DType::U8;
pub const uint32: DType = DType::U32;
pub const int32: DType = DType::I32;
pub const int64: DType = DType::I64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    BF16,
    F16,
    F32,
    F64,
    BOOL,
    U8,
    U32,
    I32,
    I64,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BF16 => "bf16",
            Self::F16 => "f16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::BOOL => "bool",
            Self::U8 => "u8",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        match self {
            Self::BF16 => 2,
            Self::F16 => 2,
            Self::F32 => 4,
            Self::F64 => 8,
            Self::BOOL => 1,
            Self::U8 => 1,
            Self::U32 => 4,
            Self::I32 => 4,
            Self::I64 => 8,
        }
    }

    pub fn is_int(&self) -> bool {
        match self {
            Self::BF16 | Self::F16 | Self::F32 | Self::F64 | Self::BOOL => false,
            Self::U8 | Self::U32 | Self::I32 | Self::I64 => true,
        }
    }

    pub fn is_float(&self) -> bool {
        match self {
            Self::BF16 | Self::F16 | Self::F32 | Self::F64 => true,
            Self::BOOL | Self::U8 | Self::U32 | Self::I32 | Self::I64 => false,
        }
    }

    /// Reads one element of this dtype from little-endian `bytes`, widened to `f64`.
    ///
    /// `bytes` must hold exactly `size_in_bytes()` bytes.
    pub fn decode(&self, bytes: &[u8]) -> f64 {
        match self {
            Self::BF16 => bf16::from_le_bytes([bytes[0], bytes[1]]).to_f64(),
            Self::F16 => f16::from_le_bytes([bytes[0], bytes[1]]).to_f64(),
            Self::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::F64 => f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
            Self::BOOL => {
                if bytes[0] != 0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::U8 => bytes[0] as f64,
            Self::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            Self::I64 => i64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as f64,
        }
    }

    /// Narrows `value` to this dtype and writes it little-endian into `out`.
    pub fn encode(&self, value: f64, out: &mut [u8]) {
        match self {
            Self::BF16 => out.copy_from_slice(&bf16::from_f64(value).to_le_bytes()),
            Self::F16 => out.copy_from_slice(&f16::from_f64(value).to_le_bytes()),
            Self::F32 => out.copy_from_slice(&(value as f32).to_le_bytes()),
            Self::F64 => out.copy_from_slice(&value.to_le_bytes()),
            Self::BOOL => out[0] = (value != 0.0) as u8,
            Self::U8 => out[0] = value as u8,
            Self::U32 => out.copy_from_slice(&(value as u32).to_le_bytes()),
            Self::I32 => out.copy_from_slice(&(value as i32).to_le_bytes()),
            Self::I64 => out.copy_from_slice(&(value as i64).to_le_bytes()),
        }
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

thread_local! {
    static DEFAULT_DTYPE: std::cell::Cell<DType> = const { std::cell::Cell::new(DType::F32) };
}

pub fn get_default_dtype() -> DType {
    DEFAULT_DTYPE.with(|d| d.get())
}

pub fn set_default_dtype(dtype: DType) {
    DEFAULT_DTYPE.with(|d| d.set(dtype));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_float_dtypes() {
        for dtype in [DType::BF16, DType::F16, DType::F32, DType::F64] {
            let mut buf = vec![0u8; dtype.size_in_bytes()];
            dtype.encode(1.5, &mut buf);
            assert_eq!(dtype.decode(&buf), 1.5);
        }
    }

    #[test]
    fn encode_narrows_ints() {
        let mut buf = [0u8; 4];
        DType::I32.encode(-3.7, &mut buf);
        assert_eq!(DType::I32.decode(&buf), -3.0);

        let mut flag = [0u8; 1];
        DType::BOOL.encode(2.0, &mut flag);
        assert_eq!(DType::BOOL.decode(&flag), 1.0);
    }

    #[test]
    fn default_dtype_is_thread_local() {
        set_default_dtype(DType::F64);
        assert_eq!(get_default_dtype(), DType::F64);
        let other = std::thread::spawn(get_default_dtype).join().unwrap();
        assert_eq!(other, DType::F32);
        set_default_dtype(DType::F32);
    }
}

//! Channel Order Conversion
//!
//! Decoded pixels are RGBA in memory. Texture uploads downstream expect a
//! packed 32-bit layout, so each 4-byte pixel gets a fixed byte permutation
//! chosen by the requested order and the host byte order.

/// Packed 32-bit pixel layout requested by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum ChannelOrder {
    #[default]
    Rgba = 0,
    Argb = 1,
    Abgr = 2,
    Bgra = 3,
}

impl ChannelOrder {
    pub const ALL: [ChannelOrder; 4] = [Self::Rgba, Self::Argb, Self::Abgr, Self::Bgra];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgba => "rgba",
            Self::Argb => "argb",
            Self::Abgr => "abgr",
            Self::Bgra => "bgra",
        }
    }
}

impl TryFrom<i32> for ChannelOrder {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Rgba),
            1 => Ok(Self::Argb),
            2 => Ok(Self::Abgr),
            3 => Ok(Self::Bgra),
            other => Err(other),
        }
    }
}

impl std::str::FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel order: {s}"))
    }
}

/// Host byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") { Self::Big } else { Self::Little }
    }
}

/// Per-pixel byte permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permutation {
    Identity,
    /// bytes 0 and 2 trade places
    SwapRedBlue,
    /// 0<->3 and 1<->2
    Reverse,
    /// R,G,B,A -> A,R,G,B
    RotateRight,
}

fn permutation(order: ChannelOrder, endian: Endian) -> Permutation {
    match (endian, order) {
        (Endian::Little, ChannelOrder::Argb) => Permutation::SwapRedBlue,
        (Endian::Little, ChannelOrder::Bgra) => Permutation::RotateRight,
        (Endian::Little, ChannelOrder::Rgba) => Permutation::Reverse,
        (Endian::Little, ChannelOrder::Abgr) => Permutation::Identity,
        (Endian::Big, ChannelOrder::Abgr) => Permutation::Reverse,
        (Endian::Big, ChannelOrder::Argb) => Permutation::RotateRight,
        (Endian::Big, ChannelOrder::Bgra) => Permutation::SwapRedBlue,
        (Endian::Big, ChannelOrder::Rgba) => Permutation::Identity,
    }
}

/// Convert RGBA pixels in place to `order` as laid out on an `endian` host.
///
/// Trailing bytes that do not form a whole pixel are left untouched.
pub fn to_channel_order(pixels: &mut [u8], order: ChannelOrder, endian: Endian) {
    match permutation(order, endian) {
        Permutation::Identity => {}
        Permutation::SwapRedBlue => pixels.chunks_exact_mut(4).for_each(|px| px.swap(0, 2)),
        Permutation::Reverse => pixels.chunks_exact_mut(4).for_each(|px| px.reverse()),
        Permutation::RotateRight => pixels.chunks_exact_mut(4).for_each(|px| px.rotate_right(1)),
    }
}

/// Inverse of [`to_channel_order`]: back to RGBA
pub fn from_channel_order(pixels: &mut [u8], order: ChannelOrder, endian: Endian) {
    match permutation(order, endian) {
        Permutation::RotateRight => pixels.chunks_exact_mut(4).for_each(|px| px.rotate_left(1)),
        // the rest are involutions
        _ => to_channel_order(pixels, order, endian),
    }
}

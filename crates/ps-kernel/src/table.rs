use crate::kernel::{Combined, Interleave, Split, run};
use crate::launch::{DestPlane, LaunchError, LaunchParams, SourcePlane};

/// Entry point shared by every specialized variant.
pub type KernelFn =
    fn(&SourcePlane<'_>, &mut DestPlane<'_>, &LaunchParams<'_>) -> Result<(), LaunchError>;

/// Sample container width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    /// Container holding `depth` significant bits (10-bit data lives in 16).
    pub fn for_depth(depth: u32) -> Option<Self> {
        match (depth + 7) & !7 {
            8 => Some(Self::Eight),
            16 => Some(Self::Sixteen),
            _ => None,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    First,
    Second,
}

/// How filtered channels map onto the destination plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DstLayout {
    /// Same channels in and out.
    Combined,
    /// One channel into one slot of a two-channel plane.
    Interleave(Component),
    /// One channel picked out of a two-channel source.
    Split(Component),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub src_channels: usize,
    pub src_depth: BitDepth,
    pub dst_depth: BitDepth,
    pub dither: bool,
    pub layout: DstLayout,
}

impl VariantKey {
    /// Drops the dither flag unless the variant narrows the sample width.
    pub fn normalized(self) -> Self {
        Self {
            dither: self.dither && self.src_depth > self.dst_depth,
            ..self
        }
    }
}

/// A specialized kernel, selected once per plane configuration.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    key: VariantKey,
    name: &'static str,
    func: KernelFn,
}

impl Kernel {
    pub fn select(key: VariantKey) -> Option<Self> {
        let key = key.normalized();
        let (name, func) = lookup(key)?;
        tracing::debug!(kernel = name, "selected kernel variant");
        Some(Self { key, name, func })
    }

    pub fn key(&self) -> VariantKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn launch(
        &self,
        src: &SourcePlane<'_>,
        dst: &mut DestPlane<'_>,
        params: &LaunchParams<'_>,
    ) -> Result<(), LaunchError> {
        (self.func)(src, dst, params)
    }
}

macro_rules! variant {
    ($S:ty, $D:ty, $ch:literal, $L:ty, $dither:literal, $name:expr) => {
        ($name, run::<$S, $D, $ch, $L, $dither> as KernelFn)
    };
}

macro_rules! variant_set {
    ($S:ty, $D:ty, $dither:literal, $base:literal, $channels:expr, $layout:expr) => {
        match ($channels, $layout) {
            (1, DstLayout::Combined) => Some(variant!($S, $D, 1, Combined, $dither, $base)),
            (2, DstLayout::Combined) => {
                Some(variant!($S, $D, 2, Combined, $dither, concat!($base, "_2")))
            }
            (3, DstLayout::Combined) => {
                Some(variant!($S, $D, 3, Combined, $dither, concat!($base, "_3")))
            }
            (4, DstLayout::Combined) => {
                Some(variant!($S, $D, 4, Combined, $dither, concat!($base, "_4")))
            }
            (1, DstLayout::Interleave(Component::First)) => Some(variant!(
                $S,
                $D,
                1,
                Interleave<0>,
                $dither,
                concat!($base, "_p2_u")
            )),
            (1, DstLayout::Interleave(Component::Second)) => Some(variant!(
                $S,
                $D,
                1,
                Interleave<1>,
                $dither,
                concat!($base, "_p2_v")
            )),
            (2, DstLayout::Split(Component::First)) => Some(variant!(
                $S,
                $D,
                2,
                Split<0>,
                $dither,
                concat!($base, "_2_u")
            )),
            (2, DstLayout::Split(Component::Second)) => Some(variant!(
                $S,
                $D,
                2,
                Split<1>,
                $dither,
                concat!($base, "_2_v")
            )),
            _ => None,
        }
    };
}

fn lookup(key: VariantKey) -> Option<(&'static str, KernelFn)> {
    use BitDepth::{Eight, Sixteen};

    let (ch, layout) = (key.src_channels, key.layout);
    match (key.src_depth, key.dst_depth, key.dither) {
        (Eight, Eight, _) => variant_set!(u8, u8, false, "subsample_bilinear_8_8", ch, layout),
        (Sixteen, Sixteen, _) => {
            variant_set!(u16, u16, false, "subsample_bilinear_16_16", ch, layout)
        }
        (Eight, Sixteen, _) => variant_set!(u8, u16, false, "subsample_bilinear_8_16", ch, layout),
        (Sixteen, Eight, false) => {
            variant_set!(u16, u8, false, "subsample_bilinear_16_8", ch, layout)
        }
        (Sixteen, Eight, true) => {
            variant_set!(u16, u8, true, "subsample_bilinear_16_8_dither", ch, layout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BitDepth, Component, DstLayout, Kernel, VariantKey};

    fn key(ch: usize, src: BitDepth, dst: BitDepth, dither: bool, layout: DstLayout) -> VariantKey {
        VariantKey {
            src_channels: ch,
            src_depth: src,
            dst_depth: dst,
            dither,
            layout,
        }
    }

    #[test]
    fn every_documented_combination_resolves() {
        let depths = [BitDepth::Eight, BitDepth::Sixteen];
        let mut count = 0;
        for src in depths {
            for dst in depths {
                for dither in [false, true] {
                    for ch in 1..=4 {
                        assert!(Kernel::select(key(ch, src, dst, dither, DstLayout::Combined)).is_some());
                        count += 1;
                    }
                    for comp in [Component::First, Component::Second] {
                        assert!(Kernel::select(key(1, src, dst, dither, DstLayout::Interleave(comp))).is_some());
                        assert!(Kernel::select(key(2, src, dst, dither, DstLayout::Split(comp))).is_some());
                        count += 2;
                    }
                }
            }
        }
        assert_eq!(count, 64);
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        let (e, s) = (BitDepth::Eight, BitDepth::Sixteen);
        assert!(Kernel::select(key(5, e, e, false, DstLayout::Combined)).is_none());
        assert!(Kernel::select(key(0, e, e, false, DstLayout::Combined)).is_none());
        assert!(Kernel::select(key(2, s, e, true, DstLayout::Interleave(Component::First))).is_none());
        assert!(Kernel::select(key(1, e, s, false, DstLayout::Split(Component::Second))).is_none());
    }

    #[test]
    fn dither_flag_only_survives_narrowing() {
        let (e, s) = (BitDepth::Eight, BitDepth::Sixteen);

        let same = Kernel::select(key(1, e, e, true, DstLayout::Combined)).expect("variant");
        let plain = Kernel::select(key(1, e, e, false, DstLayout::Combined)).expect("variant");
        assert!(!same.key().dither);
        assert_eq!(same.name(), plain.name());

        let narrowing = Kernel::select(key(1, s, e, true, DstLayout::Combined)).expect("variant");
        assert!(narrowing.key().dither);
        assert_eq!(narrowing.name(), "subsample_bilinear_16_8_dither");
    }

    #[test]
    fn names_follow_layout_suffixes() {
        let e = BitDepth::Eight;
        let s = BitDepth::Sixteen;
        let name = |k| Kernel::select(k).expect("variant").name();

        assert_eq!(name(key(2, s, s, false, DstLayout::Combined)), "subsample_bilinear_16_16_2");
        assert_eq!(
            name(key(1, e, e, false, DstLayout::Interleave(Component::Second))),
            "subsample_bilinear_8_8_p2_v"
        );
        assert_eq!(
            name(key(2, e, s, false, DstLayout::Split(Component::First))),
            "subsample_bilinear_8_16_2_u"
        );
    }

    #[test]
    fn container_depth_rounds_up_to_bytes() {
        assert_eq!(BitDepth::for_depth(8), Some(BitDepth::Eight));
        assert_eq!(BitDepth::for_depth(10), Some(BitDepth::Sixteen));
        assert_eq!(BitDepth::for_depth(16), Some(BitDepth::Sixteen));
        assert_eq!(BitDepth::for_depth(32), None);
        assert_eq!(BitDepth::Sixteen.bits(), 16);
    }
}

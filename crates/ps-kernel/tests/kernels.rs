use ps_core::{AddressMode, Plane};
use ps_kernel::{
    BitDepth, Component, DestPlane, DitherTable, DstLayout, Kernel, LaunchError, LaunchParams,
    SourcePlane, VariantKey,
};

fn kernel(ch: usize, src: BitDepth, dst: BitDepth, dither: bool, layout: DstLayout) -> Kernel {
    Kernel::select(VariantKey {
        src_channels: ch,
        src_depth: src,
        dst_depth: dst,
        dither,
        layout,
    })
    .expect("supported variant")
}

fn params(
    src: (usize, usize),
    dst: (usize, usize),
    dither: Option<&DitherTable>,
) -> LaunchParams<'_> {
    LaunchParams {
        dst_width: dst.0,
        dst_height: dst.1,
        src_width: src.0,
        src_height: src.1,
        address_mode: AddressMode::Clamp,
        dither,
    }
}

fn gradient_u8(width: usize, height: usize) -> Plane<u8> {
    let data = (0..width * height)
        .map(|i| ((i * 37 + i / width * 11) % 251) as u8)
        .collect();
    Plane::from_vec(width, height, 1, data).expect("valid plane")
}

#[test]
fn unit_scale_is_identity() {
    let src = gradient_u8(67, 35);
    let mut dst = Plane::with_stride(67, 35, 1, 96, 0u8).expect("alloc");

    let k = kernel(1, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Combined);
    k.launch(
        &SourcePlane::U8(src.as_view()),
        &mut DestPlane::U8(dst.as_view_mut()),
        &params((67, 35), (67, 35), None),
    )
    .expect("launch");

    for y in 0..35 {
        assert_eq!(dst.as_view().row(y), src.as_view().row(y), "row {y}");
    }
}

#[test]
fn uniform_plane_survives_every_ratio_and_depth() {
    let table = DitherTable::upload().expect("dither table");
    let sizes = [(64, 48), (17, 9), (200, 3), (5, 130)];

    for &(sw, sh) in &[(64usize, 48usize), (333, 77)] {
        let src8 = Plane::new_fill(sw, sh, 1, 200u8);
        let src16 = Plane::new_fill(sw, sh, 1, 0xC8C8u16);

        for &(dw, dh) in &sizes {
            let p = params((sw, sh), (dw, dh), Some(&table));

            let mut d88 = Plane::new_fill(dw, dh, 1, 0u8);
            kernel(1, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Combined)
                .launch(&SourcePlane::U8(src8.as_view()), &mut DestPlane::U8(d88.as_view_mut()), &p)
                .expect("8->8");
            assert!(d88.data().iter().all(|&v| v == 200));

            let mut d816 = Plane::new_fill(dw, dh, 1, 0u16);
            kernel(1, BitDepth::Eight, BitDepth::Sixteen, false, DstLayout::Combined)
                .launch(&SourcePlane::U8(src8.as_view()), &mut DestPlane::U16(d816.as_view_mut()), &p)
                .expect("8->16");
            assert!(d816.data().iter().all(|&v| v == 200 << 8));

            let mut d1616 = Plane::new_fill(dw, dh, 1, 0u16);
            kernel(1, BitDepth::Sixteen, BitDepth::Sixteen, false, DstLayout::Combined)
                .launch(&SourcePlane::U16(src16.as_view()), &mut DestPlane::U16(d1616.as_view_mut()), &p)
                .expect("16->16");
            assert!(d1616.data().iter().all(|&v| v == 0xC8C8));

            let mut d168 = Plane::new_fill(dw, dh, 1, 0u8);
            kernel(1, BitDepth::Sixteen, BitDepth::Eight, false, DstLayout::Combined)
                .launch(&SourcePlane::U16(src16.as_view()), &mut DestPlane::U8(d168.as_view_mut()), &p)
                .expect("16->8");
            assert!(d168.data().iter().all(|&v| v == 0xC8));

            let mut dith = Plane::new_fill(dw, dh, 1, 0u8);
            kernel(1, BitDepth::Sixteen, BitDepth::Eight, true, DstLayout::Combined)
                .launch(&SourcePlane::U16(src16.as_view()), &mut DestPlane::U8(dith.as_view_mut()), &p)
                .expect("16->8 dithered");
            assert!(dith.data().iter().all(|&v| v == 0xC8 || v == 0xC9));
        }
    }
}

#[test]
fn dither_spreads_fraction_over_the_pattern() {
    // 0x8080 sits half way between 0x80 and 0x81 in 8-bit terms.
    let table = DitherTable::upload().expect("dither table");
    let src = Plane::new_fill(128, 128, 1, 0x8080u16);
    let mut dst = Plane::new_fill(64, 64, 1, 0u8);

    kernel(1, BitDepth::Sixteen, BitDepth::Eight, true, DstLayout::Combined)
        .launch(
            &SourcePlane::U16(src.as_view()),
            &mut DestPlane::U8(dst.as_view_mut()),
            &params((128, 128), (64, 64), Some(&table)),
        )
        .expect("launch");

    let ups = dst.data().iter().filter(|&&v| v == 0x81).count();
    let downs = dst.data().iter().filter(|&&v| v == 0x80).count();
    assert_eq!(ups + downs, 64 * 64);
    // The fraction 0x80/0x100 rounds up for roughly half of the thresholds.
    assert!((1800..=2300).contains(&ups), "ups = {ups}");
}

#[test]
fn dither_request_is_ignored_at_equal_depth() {
    let src = gradient_u8(90, 60);
    let mut plain = Plane::new_fill(41, 27, 1, 0u8);
    let mut dithered = Plane::new_fill(41, 27, 1, 0u8);
    let table = DitherTable::upload().expect("dither table");
    let p = params((90, 60), (41, 27), Some(&table));

    kernel(1, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Combined)
        .launch(&SourcePlane::U8(src.as_view()), &mut DestPlane::U8(plain.as_view_mut()), &p)
        .expect("plain");
    kernel(1, BitDepth::Eight, BitDepth::Eight, true, DstLayout::Combined)
        .launch(&SourcePlane::U8(src.as_view()), &mut DestPlane::U8(dithered.as_view_mut()), &p)
        .expect("dithered");

    assert_eq!(plain.data(), dithered.data());
}

#[test]
fn exact_halving_averages_two_by_two_blocks() {
    // At 2:1 the four taps land exactly on texel centers, so every output
    // is the rounded mean of its 2x2 source block.
    let data: Vec<u8> = (0..16 * 8).map(|i| if i % 2 == 0 { 0 } else { 100 }).collect();
    let src = Plane::from_vec(16, 8, 1, data).expect("valid plane");
    let mut dst = Plane::new_fill(8, 4, 1, 0u8);

    kernel(1, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Combined)
        .launch(
            &SourcePlane::U8(src.as_view()),
            &mut DestPlane::U8(dst.as_view_mut()),
            &params((16, 8), (8, 4), None),
        )
        .expect("launch");

    assert!(dst.data().iter().all(|&v| v == 50));
}

#[test]
fn planar_chroma_interleaves_into_two_channel_plane() {
    let u = Plane::new_fill(8, 6, 1, 40u8);
    let v = Plane::new_fill(8, 6, 1, 220u8);
    let mut uv = Plane::with_stride(4, 3, 2, 16, 7u8).expect("alloc");

    let p = params((8, 6), (4, 3), None);
    for (plane, comp) in [(&u, Component::First), (&v, Component::Second)] {
        kernel(1, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Interleave(comp))
            .launch(&SourcePlane::U8(plane.as_view()), &mut DestPlane::U8(uv.as_view_mut()), &p)
            .expect("interleave");
    }

    let view = uv.as_view();
    for y in 0..3 {
        assert_eq!(view.row(y), &[40, 220, 40, 220, 40, 220, 40, 220]);
    }
    // Stride padding is untouched.
    assert_eq!(uv.data()[8], 7);
}

#[test]
fn interleaved_chroma_splits_into_planes() {
    let mut data = Vec::new();
    for _ in 0..(6 * 4) {
        data.extend_from_slice(&[1000u16, 60000]);
    }
    let uv = Plane::from_vec(6, 4, 2, data).expect("valid plane");
    let mut u = Plane::new_fill(3, 2, 1, 0u8);
    let mut v = Plane::new_fill(3, 2, 1, 0u8);

    let p = params((6, 4), (3, 2), None);
    kernel(2, BitDepth::Sixteen, BitDepth::Eight, false, DstLayout::Split(Component::First))
        .launch(&SourcePlane::U16(uv.as_view()), &mut DestPlane::U8(u.as_view_mut()), &p)
        .expect("split u");
    kernel(2, BitDepth::Sixteen, BitDepth::Eight, false, DstLayout::Split(Component::Second))
        .launch(&SourcePlane::U16(uv.as_view()), &mut DestPlane::U8(v.as_view_mut()), &p)
        .expect("split v");

    assert!(u.data().iter().all(|&s| s == (1000 >> 8) as u8));
    assert!(v.data().iter().all(|&s| s == (60000 >> 8) as u8));
}

#[test]
fn four_channel_pixels_keep_channels_apart() {
    let mut data = Vec::new();
    for _ in 0..(10 * 10) {
        data.extend_from_slice(&[10u8, 20, 30, 255]);
    }
    let src = Plane::from_vec(10, 10, 4, data).expect("valid plane");
    let mut dst = Plane::new_fill(3, 7, 4, 0u8);

    kernel(4, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Combined)
        .launch(
            &SourcePlane::U8(src.as_view()),
            &mut DestPlane::U8(dst.as_view_mut()),
            &params((10, 10), (3, 7), None),
        )
        .expect("launch");

    for px in dst.data().chunks_exact(4) {
        assert_eq!(px, &[10, 20, 30, 255]);
    }
}

#[test]
fn mismatched_planes_fail_the_launch() {
    let src = Plane::new_fill(4, 4, 1, 0u16);
    let mut dst = Plane::new_fill(2, 2, 1, 0u8);
    let p = params((4, 4), (2, 2), None);

    let k8 = kernel(1, BitDepth::Eight, BitDepth::Eight, false, DstLayout::Combined);
    let err = k8
        .launch(&SourcePlane::U16(src.as_view()), &mut DestPlane::U8(dst.as_view_mut()), &p)
        .unwrap_err();
    assert_eq!(err, LaunchError::SourceDepth { expected: 8, actual: 16 });

    let k2 = kernel(2, BitDepth::Sixteen, BitDepth::Eight, false, DstLayout::Combined);
    let err = k2
        .launch(&SourcePlane::U16(src.as_view()), &mut DestPlane::U8(dst.as_view_mut()), &p)
        .unwrap_err();
    assert_eq!(err, LaunchError::SourceChannels { expected: 2, actual: 1 });

    let kd = kernel(1, BitDepth::Sixteen, BitDepth::Eight, true, DstLayout::Combined);
    let err = kd
        .launch(&SourcePlane::U16(src.as_view()), &mut DestPlane::U8(dst.as_view_mut()), &p)
        .unwrap_err();
    assert_eq!(err, LaunchError::MissingDither);

    let k16 = kernel(1, BitDepth::Sixteen, BitDepth::Eight, false, DstLayout::Combined);
    let err = k16
        .launch(
            &SourcePlane::U16(src.as_view()),
            &mut DestPlane::U8(dst.as_view_mut()),
            &params((4, 4), (3, 3), None),
        )
        .unwrap_err();
    assert!(matches!(err, LaunchError::Region(_)));
}

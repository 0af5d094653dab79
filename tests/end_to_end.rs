use rust_fnn::{ActivationKind, Matrix, Network, Page, Pages, RandomGenerator, State};

#[test]
fn zero_weights_seven_segment_outputs_half() {
    let mut pages = Pages::seven_segment().unwrap();
    let mut net = Network::create(&mut pages).unwrap();
    assert_eq!(net.state(), State::Safe);

    net.step_forward();
    let y = net.output().unwrap();
    assert_eq!(y.len(), 10);
    for &v in y {
        assert!((v - 0.5).abs() < 1e-7, "output {v}");
    }

    net.destroy();
    net.destroy();
    assert_eq!(net.state(), State::Destroyed);
}

// Segments a..g for the digits 0..9.
const SEGMENTS: [[f32; 7]; 10] = [
    [1., 1., 1., 1., 1., 1., 0.],
    [0., 1., 1., 0., 0., 0., 0.],
    [1., 1., 0., 1., 1., 0., 1.],
    [1., 1., 1., 1., 0., 0., 1.],
    [0., 1., 1., 0., 0., 1., 1.],
    [1., 0., 1., 1., 0., 1., 1.],
    [1., 0., 1., 1., 1., 1., 1.],
    [1., 1., 1., 0., 0., 0., 0.],
    [1., 1., 1., 1., 1., 1., 1.],
    [1., 1., 1., 1., 0., 1., 1.],
];

fn digit_error(net: &mut Network<'_>) -> f32 {
    let mut total = 0.0;
    for (digit, segments) in SEGMENTS.iter().enumerate() {
        net.input_mut().unwrap().copy_from_slice(segments);
        net.step_forward();
        for (j, &y) in net.output().unwrap().iter().enumerate() {
            let t = if j == digit { 1.0 } else { 0.0 };
            total += (y - t) * (y - t);
        }
    }
    total
}

#[test]
fn seven_segment_learns_its_digits() {
    let mut pages = Pages::seven_segment().unwrap();
    let mut net = Network::create(&mut pages).unwrap();
    net.init_weights(0.5, &mut RandomGenerator::new(1));

    let before = digit_error(&mut net);
    let mut target = [0.0_f32; 10];
    for _ in 0..500 {
        for (digit, segments) in SEGMENTS.iter().enumerate() {
            target.fill(0.0);
            target[digit] = 1.0;
            net.input_mut().unwrap().copy_from_slice(segments);
            net.step_forward();
            net.step_errors(&target);
            net.step_backward();
        }
    }
    let after = digit_error(&mut net);
    assert!(after < before, "before={before} after={after}");
}

fn wired(widths: &[usize]) -> Pages {
    let pages = widths
        .windows(2)
        .enumerate()
        .map(|(k, w)| Page::new(k, w[0], w[1], 0.1, ActivationKind::Tanh))
        .collect();
    Pages::new(pages)
}

#[test]
fn create_accepts_any_well_formed_stack() {
    for widths in [&[1, 1, 1][..], &[3, 4, 2], &[7, 20, 20, 10], &[2, 9, 9, 9, 9, 1]] {
        let mut pages = wired(widths);
        let mut net = Network::create(&mut pages).unwrap();
        assert_eq!(net.num_layers(), widths.len() - 1);
        net.destroy();
        net.destroy();
    }
}

#[test]
fn create_rejects_malformed_stacks() {
    // Wrong matrix dimension.
    let mut pages = wired(&[3, 4, 2]);
    pages.pages[0].w = Matrix::zeros(4, 3);
    assert!(Network::create(&mut pages).is_err());

    // Mismatched buffer length.
    let mut pages = wired(&[3, 4, 2]);
    pages.pages[1].dy_dz.pop();
    assert!(Network::create(&mut pages).is_err());

    // Mismatched layer id.
    let mut pages = wired(&[3, 4, 2]);
    pages.pages[0].l_id = 1;
    assert!(Network::create(&mut pages).is_err());

    // Broken wiring between stages.
    let mut pages = wired(&[3, 4, 2]);
    pages.pages[1] = Page::new(1, 3, 2, 0.1, ActivationKind::Tanh);
    assert!(Network::create(&mut pages).is_err());

    // Fewer than two stages.
    let mut pages = wired(&[3, 4]);
    assert!(Network::create(&mut pages).is_err());
}

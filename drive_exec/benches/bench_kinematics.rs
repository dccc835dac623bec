use criterion::{black_box, criterion_group, criterion_main, Criterion};

use drive_lib::kinematics::{ChassisKinematics, ChassisSpeeds};

const MODULE_POS_M_RB: [[f64; 2]; 4] = [
    [0.3, 0.3],
    [0.3, -0.3],
    [-0.3, 0.3],
    [-0.3, -0.3],
];

fn bench_inverse(c: &mut Criterion) {
    let mut kin = ChassisKinematics::new(MODULE_POS_M_RB).unwrap();
    let speeds = ChassisSpeeds::new(3.0, -1.5, 4.0);

    c.bench_function("inverse kinematics + desaturate", |b| {
        b.iter(|| {
            let mut states = kin.to_module_states(black_box(&speeds));
            ChassisKinematics::desaturate(&mut states, black_box(4.0));
            states
        })
    });
}

fn bench_forward(c: &mut Criterion) {
    let mut kin = ChassisKinematics::new(MODULE_POS_M_RB).unwrap();
    let states = kin.to_module_states(&ChassisSpeeds::new(1.0, 0.5, -0.8));

    c.bench_function("forward kinematics", |b| {
        b.iter(|| kin.to_chassis_speeds(black_box(&states)))
    });
}

criterion_group!(benches, bench_inverse, bench_forward);
criterion_main!(benches);

//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value between min and max.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Get the signed shortest angular distance required to move from `from` to
/// `to`.
///
/// Both angles may be unbounded (continuous). The result is in the range
/// (-pi, pi], positive meaning counter-clockwise.
pub fn get_ang_dist_pi<T>(from: T, to: T) -> T
where
    T: Float
{
    wrap_pi(to - from)
}

/// Wrap an angle in radians into the range (-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    // Shift into [0, 2pi), then back down, flipping the -pi edge over to +pi.
    let w = pi_t - rem_euclid(pi_t - angle, tau_t);

    if w <= -pi_t {
        w + tau_t
    }
    else {
        w
    }
}

/// Wrap an angle in degrees into the range (-180, 180].
pub fn wrap_180_deg<T>(angle_deg: T) -> T
where
    T: Float
{
    wrap_pi(angle_deg.to_radians()).to_degrees()
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;
    const EPS: f64 = 1e-12;

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0f64)).abs() < EPS);
        assert!((wrap_pi(PI) - PI).abs() < EPS);
        assert!((wrap_pi(-PI) - PI).abs() < EPS);
        assert!((wrap_pi(3.0 * PI) - PI).abs() < EPS);
        assert!((wrap_pi(2.5 * PI) - 0.5 * PI).abs() < EPS);
        assert!((wrap_pi(-2.5 * PI) + 0.5 * PI).abs() < EPS);
        assert!((wrap_pi(TAU + 1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_wrap_180_deg() {
        assert!((wrap_180_deg(190f64) + 170.0).abs() < 1e-9);
        assert!((wrap_180_deg(-180f64) - 180.0).abs() < 1e-9);
        assert!((wrap_180_deg(725f64) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_get_ang_dist_pi() {
        assert!((get_ang_dist_pi(1f64, 2f64) - 1.0).abs() < EPS);
        assert!((get_ang_dist_pi(2f64, 1f64) + 1.0).abs() < EPS);
        assert!((get_ang_dist_pi(0f64, TAU)).abs() < EPS);

        // Crossing the +-pi seam goes the short way
        let d = get_ang_dist_pi(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-9);

        // Continuous (unbounded) inputs
        let d = get_ang_dist_pi(10.0 * TAU + 0.1, -0.1);
        assert!((d + 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_ang_dist_never_exceeds_half_turn() {
        let mut a = -20.0;
        while a < 20.0 {
            let mut b = -20.0;
            while b < 20.0 {
                let d = get_ang_dist_pi(a, b);
                assert!(d.abs() <= PI + EPS);

                // Moving by d must land on the target modulo a full turn
                assert!(wrap_pi(a + d - b).abs() < 1e-9);
                b += 0.37;
            }
            a += 0.41;
        }
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&5f64, &-1f64, &1f64), 1.0);
        assert_eq!(clamp(&-5f64, &-1f64, &1f64), -1.0);
        assert_eq!(clamp(&0.25f64, &-1f64, &1f64), 0.25);
    }
}

use passage_core::Distance;

fn dot64(a: &[f32], b: &[f32]) -> f64 {
	a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum()
}

/// Accumulated in f64 and saturated to the finite f32 range.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
	dot64(a, b).clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32
}

/// Cosine similarity; 0.0 when either side has zero norm.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
	let na = dot64(a, a).sqrt();
	let nb = dot64(b, b).sqrt();
	if na == 0.0 || nb == 0.0 {
		return 0.0;
	}
	(dot64(a, b) / (na * nb)).clamp(-1.0, 1.0) as f32
}

pub fn similarity(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
	match distance {
		Distance::Cosine => cosine(a, b),
		Distance::Dot => dot(a, b),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cosine_of_parallel_and_orthogonal() {
		assert!((cosine(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
		assert_eq!(cosine(&[1.0, 0.0], &[0.0, 3.0]), 0.0);
		assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
	}

	#[test]
	fn dot_is_unnormalized() {
		assert_eq!(similarity(Distance::Dot, &[1.0, 2.0], &[3.0, 4.0]), 11.0);
	}

	#[test]
	fn large_components_stay_finite() {
		assert_eq!(dot(&[1e20, 0.0], &[1e20, 0.0]), f32::MAX);
		assert_eq!(dot(&[-1e20, 0.0], &[1e20, 0.0]), f32::MIN);
		assert!((cosine(&[1e20, 0.0], &[3e30, 0.0]) - 1.0).abs() < 1e-6);
	}
}

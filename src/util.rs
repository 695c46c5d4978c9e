use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use bincode::{config, Decode, Encode};
use lin_alg::f64::Vec3;

use crate::error::Result;

/// Save to file, using Bincode.
pub fn save<T: Encode>(path: &Path, data: &T) -> Result<()> {
    let encoded = bincode::encode_to_vec(data, config::standard())?;

    let mut file = File::create(path)?;
    file.write_all(&encoded)?;
    Ok(())
}

/// Load from file, using Bincode.
pub fn load<T: Decode<()>>(path: &Path) -> Result<T> {
    let mut buf = Vec::new();
    let mut file = File::open(path)?;
    file.read_to_end(&mut buf)?;

    let (decoded, _len) = bincode::decode_from_slice(&buf, config::standard())?;
    Ok(decoded)
}

pub fn vec_is_finite(v: Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

pub fn vec_to_f32(v: Vec3) -> lin_alg::f32::Vec3 {
    lin_alg::f32::Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_check_catches_nan_and_inf() {
        assert!(vec_is_finite(Vec3::new(1., -2., 0.)));
        assert!(!vec_is_finite(Vec3::new(f64::NAN, 0., 0.)));
        assert!(!vec_is_finite(Vec3::new(0., 0., f64::INFINITY)));
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join("sph_fluid_util_test.bin");
        let data: Vec<(u32, f64)> = vec![(1, 0.5), (2, -3.25)];

        save(&path, &data).unwrap();
        let loaded: Vec<(u32, f64)> = load(&path).unwrap();
        assert_eq!(loaded, data);

        let _ = std::fs::remove_file(path);
    }
}

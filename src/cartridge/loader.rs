use super::error::LoadError;
use std::fs;
use std::path::Path;

pub fn validate_extension(path: &Path) -> Result<(), LoadError> {
    let ext = path
        .extension()
        .ok_or(LoadError::MissingExtension)?
        .to_str()
        .ok_or(LoadError::MissingExtension)?;

    if ext.eq_ignore_ascii_case("gb") || ext.eq_ignore_ascii_case("gbc") {
        Ok(())
    } else {
        Err(LoadError::InvalidExtension {
            expected: ".gb or .gbc",
            found: ext.to_string(),
        })
    }
}

pub fn load_rom(path: &Path) -> Result<Vec<u8>, LoadError> {
    validate_extension(path)?;
    let buffer = fs::read(path)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_extensions() {
        let cases = ["test.txt", "test.out", "game.rom", "gb.txt", ".gb.txt"];

        for case in cases {
            let path = Path::new(case);
            let result = validate_extension(path);
            assert!(
                matches!(result, Err(LoadError::InvalidExtension { .. })),
                "expected InvalidExtension for path {:?}, got {:?}",
                path,
                result
            );
        }
    }

    #[test]
    fn test_validate_extension_missing() {
        let path = Path::new("file"); // no extension
        let result = validate_extension(path);
        assert!(matches!(result, Err(LoadError::MissingExtension)));
    }

    #[test]
    fn correct_file_extensions() {
        let cases = [
            "game.gb",
            "game.gbc",
            "GaMe.GB",
            "Foreign keyboard chars åäö.Gb",
            "mIxEd.gBc",
        ];

        for case in cases {
            let path = Path::new(case);
            let result = validate_extension(path);
            assert!(
                result.is_ok(),
                "expected Ok for path {:?}, got {:?}",
                path,
                result
            );
        }
    }
}

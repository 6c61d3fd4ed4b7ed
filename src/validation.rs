//! Client-side form checks, mirroring the rules the API enforces.
//!
//! Running these first avoids a round trip for input the server would
//! reject anyway.

use crate::error::Error;
use crate::models::{ImageUpload, Registration};

/// Largest accepted image upload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Validates an image upload.
///
/// A valid image:
/// - has a `.jpg`, `.jpeg`, or `.png` extension (any case)
/// - is at most [`MAX_IMAGE_BYTES`] long
///
/// # Errors
///
/// Returns [`Error::Validation`] describing the first rule broken.
pub fn validate_image(image: &ImageUpload) -> Result<(), Error> {
    let name = image.file_name.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return Err(Error::Validation(
            "Only .jpg, .jpeg, .png files are allowed.".into(),
        ));
    }
    if image.bytes.len() > MAX_IMAGE_BYTES {
        return Err(Error::Validation("Image size should be <= 5MB".into()));
    }
    Ok(())
}

/// # Errors
///
/// Returns [`Error::Validation`] if a required field is blank, the email has
/// no `@`, the passwords differ, or the profile picture is not acceptable.
pub fn validate_registration(form: &Registration) -> Result<(), Error> {
    if form.username.trim().is_empty() {
        return Err(Error::Validation("Username is required.".into()));
    }
    if !form.email.contains('@') {
        return Err(Error::Validation("A valid email is required.".into()));
    }
    validate_new_password(&form.password, &form.password2)?;
    if let Some(picture) = &form.profile_picture {
        validate_image(picture)?;
    }
    Ok(())
}

/// # Errors
///
/// Returns [`Error::Validation`] if the password is empty or the two entries differ.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), Error> {
    if password.is_empty() {
        return Err(Error::Validation("Password is required.".into()));
    }
    if password != confirmation {
        return Err(Error::Validation("Passwords do not match.".into()));
    }
    Ok(())
}

/// Rejects blank text (comments, category names).
///
/// # Errors
///
/// Returns [`Error::Validation`] naming `field`.
pub fn require_text(field: &str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{field} must not be blank.")));
    }
    Ok(())
}

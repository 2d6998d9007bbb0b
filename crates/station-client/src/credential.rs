use sha2::Sha256;

/// PBKDF2 迭代次数
pub const PBKDF2_ITERATIONS: u32 = 1000;

/// 派生密钥长度（字节）
pub const DERIVED_KEY_LEN: usize = 16;

/// 计算登录密码
///
/// 两级 PBKDF2-HMAC-SHA256：第一级以原始密码和 `salt` 派生，
/// 第二级以第一级结果的**十六进制字符串**作为密码、`salt_web_ui` 作为盐。
/// 设备只接受这种链式结果。
pub fn derive_login_password(raw_password: &str, salt: &str, salt_web_ui: &str) -> String {
    let stage1 = pbkdf2_hex(raw_password, salt);
    pbkdf2_hex(&stage1, salt_web_ui)
}

fn pbkdf2_hex(password: &str, salt: &str) -> String {
    let mut key = [0u8; DERIVED_KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    hex::encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_stage() {
        assert_eq!(pbkdf2_hex("secret", "abc"), "7b30303d6ff0baca5253cdd9e1a5362c");
    }

    #[test]
    fn test_chained_derivation() {
        assert_eq!(
            derive_login_password("secret", "abc", "def"),
            "12aba7db1d0f95a0809d192643dfade4"
        );
        assert_eq!(
            derive_login_password("Passw0rd!", "8tDjhP3W4k2Q", "0Wn1uSKEgjzu"),
            "86e1f9254a6bd5f96eda19830c8c25b1"
        );
    }

    #[test]
    fn test_output_is_lowercase_hex() {
        for (password, salt, salt_web_ui) in [
            ("", "", ""),
            ("admin", "s1", "s2"),
            ("ünïcødé", "盐", "saltwebui"),
        ] {
            let derived = derive_login_password(password, salt, salt_web_ui);
            assert_eq!(derived.len(), 32);
            assert!(derived
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            assert_eq!(derived, derive_login_password(password, salt, salt_web_ui));
        }
    }

    #[test]
    fn test_stage_chaining_uses_hex_string() {
        // 第二级的输入是十六进制文本，而不是原始字节
        let stage1 = pbkdf2_hex("secret", "abc");
        assert_eq!(pbkdf2_hex(&stage1, "def"), derive_login_password("secret", "abc", "def"));
    }
}

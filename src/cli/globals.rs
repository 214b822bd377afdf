use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub student_url: String,
    pub cms_url: String,
    pub events_url: String,
    pub api_key: SecretString,
    pub staff_email: String,
    pub staff_password: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(student_url: String, cms_url: String, events_url: String) -> Self {
        Self {
            student_url,
            cms_url,
            events_url,
            api_key: SecretString::from(String::new()),
            staff_email: String::new(),
            staff_password: SecretString::from(String::new()),
        }
    }

    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.api_key = api_key;
    }

    pub fn set_staff_credentials(&mut self, email: String, password: SecretString) {
        self.staff_email = email;
        self.staff_password = password;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://student.antifraud.tld".to_string(),
            "https://cms.antifraud.tld".to_string(),
            "https://events.antifraud.tld".to_string(),
        );
        assert_eq!(args.student_url, "https://student.antifraud.tld");
        assert_eq!(args.cms_url, "https://cms.antifraud.tld");
        assert_eq!(args.api_key.expose_secret(), "");
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let mut args = GlobalArgs::new(
            "https://student.antifraud.tld".to_string(),
            "https://cms.antifraud.tld".to_string(),
            "https://events.antifraud.tld".to_string(),
        );
        args.set_staff_credentials(
            "staff@school.tld".to_string(),
            SecretString::from("hunter2".to_string()),
        );

        let debugged = format!("{args:?}");
        assert!(!debugged.contains("hunter2"));
    }
}

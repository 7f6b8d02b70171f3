//! Input rows. Read-side shapes come from courier-types; the only row that
//! carries a password hash is this one, and it is write-only.

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
}

pub struct NewMessage<'a> {
    pub from_username: &'a str,
    pub to_username: &'a str,
    pub body: &'a str,
}

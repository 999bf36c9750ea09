use std::fmt;
use std::str::FromStr;

/// Type id reserved for the node registry bundle stored under the index node
pub const REGISTRY_TYPE_ID: i32 = -1;

macro_rules! metadata_entries {
    ($(($variant:ident, $id:literal, $name:literal)),* $(,)?) => {
        /// Logical document kinds stored on the storage node
        ///
        /// Discriminants are the wire `typeId`. They are explicit so that a
        /// repeated tag fails to compile.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum MetadataEntry {
            $($variant = $id,)*
        }

        impl MetadataEntry {
            pub const ALL: &'static [MetadataEntry] = &[$(MetadataEntry::$variant,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(MetadataEntry::$variant => $name,)*
                }
            }
        }

        impl TryFrom<i32> for MetadataEntry {
            type Error = UnknownEntry;

            fn try_from(id: i32) -> Result<Self, Self::Error> {
                match id {
                    $($id => Ok(MetadataEntry::$variant),)*
                    _ => Err(UnknownEntry(id.to_string())),
                }
            }
        }
    };
}

metadata_entries! {
    (WhatsNew, 2, "whats_new"),
    (BuySell, 3, "buy_sell"),
    (Contacts, 4, "contacts"),
    (Ethereum, 5, "ethereum"),
    (Shapeshift, 6, "shapeshift"),
    (BitcoinCash, 7, "bitcoin_cash"),
    (Bitcoin, 8, "bitcoin"),
    (Lockbox, 9, "lockbox"),
    (UserCredentials, 10, "user_credentials"),
    (Stellar, 11, "stellar"),
    (WalletCredentials, 12, "wallet_credentials"),
    (WalletConnect, 13, "wallet_connect"),
    (AccountCredentials, 14, "account_credentials"),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metadata entry: {0}")]
pub struct UnknownEntry(String);

impl MetadataEntry {
    pub fn type_id(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for MetadataEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.type_id())
    }
}

/// Parses either the entry name (`shapeshift`) or its type id (`6`)
impl FromStr for MetadataEntry {
    type Err = UnknownEntry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<i32>() {
            return MetadataEntry::try_from(id);
        }
        MetadataEntry::ALL
            .iter()
            .copied()
            .find(|entry| entry.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEntry(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_type_ids_and_names_are_unique() {
        let ids: HashSet<i32> = MetadataEntry::ALL.iter().map(|e| e.type_id()).collect();
        let names: HashSet<&str> = MetadataEntry::ALL.iter().map(|e| e.name()).collect();
        assert_eq!(ids.len(), MetadataEntry::ALL.len());
        assert_eq!(names.len(), MetadataEntry::ALL.len());
    }

    #[test]
    fn test_registry_id_is_not_an_entry() {
        assert!(MetadataEntry::try_from(REGISTRY_TYPE_ID).is_err());
    }

    #[test]
    fn test_parse_by_name_or_id() {
        assert_eq!(
            "shapeshift".parse::<MetadataEntry>().unwrap(),
            MetadataEntry::Shapeshift
        );
        assert_eq!("6".parse::<MetadataEntry>().unwrap(), MetadataEntry::Shapeshift);
        assert_eq!(
            "Wallet_Connect".parse::<MetadataEntry>().unwrap(),
            MetadataEntry::WalletConnect
        );
        assert!("99".parse::<MetadataEntry>().is_err());
        assert!("nope".parse::<MetadataEntry>().is_err());
    }

    #[test]
    fn test_round_trip_through_type_id() {
        for entry in MetadataEntry::ALL {
            assert_eq!(MetadataEntry::try_from(entry.type_id()).unwrap(), *entry);
        }
    }
}

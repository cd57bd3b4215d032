use std::str::FromStr;

// one line per region: variant and name, the endpoint is derived from the name
// https://docs.aws.amazon.com/general/latest/gr/glacier-service.html
macro_rules! regions {
    ($($variant:ident => $name:literal,)+) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Region {
            $($variant,)+
            /// Compatible service reachable at `endpoint`, requests are signed for `name`
            Custom { name: String, endpoint: String },
        }

        impl Region {
            #[must_use]
            pub fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $name,)+
                    Self::Custom { name, .. } => name,
                }
            }
        }

        impl FromStr for Region {
            type Err = ParseRegionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(ParseRegionError(s.to_string())),
                }
            }
        }
    };
}

regions! {
    AfSouth1 => "af-south-1",
    ApEast1 => "ap-east-1",
    ApNortheast1 => "ap-northeast-1",
    ApNortheast2 => "ap-northeast-2",
    ApNortheast3 => "ap-northeast-3",
    ApSouth1 => "ap-south-1",
    ApSoutheast1 => "ap-southeast-1",
    ApSoutheast2 => "ap-southeast-2",
    CaCentral1 => "ca-central-1",
    CnNorth1 => "cn-north-1",
    CnNorthwest1 => "cn-northwest-1",
    EuCentral1 => "eu-central-1",
    EuNorth1 => "eu-north-1",
    EuSouth1 => "eu-south-1",
    EuWest1 => "eu-west-1",
    EuWest2 => "eu-west-2",
    EuWest3 => "eu-west-3",
    MeSouth1 => "me-south-1",
    SaEast1 => "sa-east-1",
    UsEast1 => "us-east-1",
    UsEast2 => "us-east-2",
    UsWest1 => "us-west-1",
    UsWest2 => "us-west-2",
}

impl Region {
    /// Host (or full URL for custom regions) of the vault service
    #[must_use]
    pub fn endpoint(&self) -> String {
        match self {
            Self::CnNorth1 | Self::CnNorthwest1 => {
                format!("glacier.{}.amazonaws.com.cn", self.name())
            }
            Self::Custom { endpoint, .. } => endpoint.clone(),
            _ => format!("glacier.{}.amazonaws.com", self.name()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("not a valid Glacier region: {0}")]
pub struct ParseRegionError(String);

/// `AWS_DEFAULT_REGION`, then `AWS_REGION`, falling back to us-east-1
impl Default for Region {
    fn default() -> Self {
        std::env::var("AWS_DEFAULT_REGION")
            .or_else(|_| std::env::var("AWS_REGION"))
            .ok()
            .and_then(|name| name.parse().ok())
            .unwrap_or(Self::UsEast1)
    }
}

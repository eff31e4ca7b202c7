use serde::{Deserialize, Serialize};

/// OpenRTB 协议版本，响应中固定返回
pub const PROTOCOL_VERSION: &str = "2.5";

/// OpenRTB Bid Response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BidResponse {
    pub id: String,
    pub seatbid: Vec<SeatBid>,
    pub version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SeatBid {
    pub bid: Vec<Bid>,
    pub seat: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Bid {
    pub id: String,
    pub impid: String,
    pub price: f64,
    pub adm: String, // Ad markup (HTML or URL)
    pub crid: String,
    pub w: u32,
    pub h: u32,
}

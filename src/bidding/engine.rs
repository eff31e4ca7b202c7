use crate::openrtb::request::ValidatedBidRequest;
use crate::openrtb::response::{Bid, BidResponse, SeatBid, PROTOCOL_VERSION};

/// 出价能力：给定已校验的请求，产出一个 SeatBid
///
/// 真实的竞价/定价引擎实现这个 trait 即可替换占位实现，不影响校验流程。
pub trait BidEvaluator: Send + Sync {
    fn evaluate(&self, request: &ValidatedBidRequest) -> SeatBid;
}

/// 固定占位出价：总是对第一个广告位出一个固定价格的 Bid
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderEvaluator {
    pub seat: String,
    pub bid_id: String,
    pub price: f64,
    pub adm: String,
    pub crid: String,
    pub w: u32,
    pub h: u32,
}

impl Default for PlaceholderEvaluator {
    fn default() -> Self {
        Self {
            seat: "seat-id-456".to_string(),
            bid_id: "bid-id-789".to_string(),
            price: 2.50,
            adm: "Example Ad".to_string(),
            crid: "creative-id-abc".to_string(),
            w: 300,
            h: 250,
        }
    }
}

impl BidEvaluator for PlaceholderEvaluator {
    fn evaluate(&self, request: &ValidatedBidRequest) -> SeatBid {
        SeatBid {
            seat: self.seat.clone(),
            bid: vec![Bid {
                id: self.bid_id.clone(),
                impid: request.first_imp().id.clone(),
                price: self.price,
                adm: self.adm.clone(),
                crid: self.crid.clone(),
                w: self.w,
                h: self.h,
            }],
        }
    }
}

/// **构造 BidResponse**
///
/// 回显请求 id，版本固定为 "2.5"，只包含 evaluator 给出的那一个 SeatBid。
pub fn build_response(request: &ValidatedBidRequest, evaluator: &dyn BidEvaluator) -> BidResponse {
    BidResponse {
        id: request.id().to_string(),
        seatbid: vec![evaluator.evaluate(request)],
        version: PROTOCOL_VERSION.to_string(),
    }
}

//! Scan processors for the council screens.
//!
//! Each processor runs one round-trip through a `Transport` and maps the
//! outcome to a `ScanResult`. The mapping itself is a plain `classify_*`
//! function so hosts that drive I/O themselves can reuse it.

use crate::api::rental_admin::{rental_error_from_transport, DEFAULT_RENTAL_ERROR_MESSAGE};
use crate::client::CouncilClient;
use crate::error::{ApiError, RentalErrorCode, RentalScanError};
use crate::http::Transport;

use super::{ScanResult, ScannerConfig};

/// A processor failure that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ScanFailure {
    pub message: String,
}

impl ScanFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns a scanned token into a result.
pub trait ScanProcessor {
    fn process(&mut self, token: &str) -> Result<ScanResult, ScanFailure>;
}

impl<F> ScanProcessor for F
where
    F: FnMut(&str) -> Result<ScanResult, ScanFailure>,
{
    fn process(&mut self, token: &str) -> Result<ScanResult, ScanFailure> {
        self(token)
    }
}

/// Return desk: `ALREADY_RETURN` is informational (`Invalid`), every other
/// recognized code is a policy rejection (`Denied`), anything else `Invalid`.
pub fn classify_return(outcome: Result<(), RentalScanError>) -> ScanResult {
    let err = match outcome {
        Ok(()) => {
            return ScanResult::success()
                .with_message("반납 완료")
                .with_action_label("반납 완료")
                .with_speech("반납되었습니다");
        }
        Err(err) => err,
    };
    let friendly = err.friendly_message();
    match err.code {
        Some(RentalErrorCode::AlreadyReturn) => {
            ScanResult::invalid(friendly.unwrap_or_else(|| "이미 반납된 물품입니다.".to_string())).with_action_label("확인")
        }
        Some(_) => ScanResult::denied(friendly.unwrap_or_else(|| "반납이 불가합니다.".to_string()))
            .with_action_label("확인")
            .with_speech("반납이 불가합니다"),
        None => ScanResult::invalid(friendly.unwrap_or_else(|| "반납 정보를 확인할 수 없어요.".to_string()))
            .with_action_label("다시 시도"),
    }
}

/// Rental desk: every recognized code is `Denied`, anything else `Invalid`.
pub fn classify_rent(outcome: Result<(), RentalScanError>) -> ScanResult {
    let err = match outcome {
        Ok(()) => {
            return ScanResult::success()
                .with_message("대여 완료")
                .with_action_label("대여 완료")
                .with_speech("대여되었습니다");
        }
        Err(err) => err,
    };
    let friendly = err.friendly_message();
    match err.code {
        Some(_) => ScanResult::denied(friendly.unwrap_or_else(|| "대여가 불가합니다.".to_string()))
            .with_action_label("확인")
            .with_speech("대여가 불가합니다"),
        None => ScanResult::invalid(friendly.unwrap_or_else(|| DEFAULT_RENTAL_ERROR_MESSAGE.to_string()))
            .with_action_label("다시 시도"),
    }
}

pub fn classify_student_fee(outcome: Result<bool, ApiError>) -> ScanResult {
    match outcome {
        Ok(true) => ScanResult::success()
            .with_message("승인 완료")
            .with_action_label("승인")
            .with_speech("확인되었습니다"),
        Ok(false) => ScanResult::denied("사유: 학생회비 미납 대상")
            .with_action_label("미승인")
            .with_speech("학생회비 미납"),
        Err(err) => ScanResult::invalid(err.user_message()).with_action_label("미승인"),
    }
}

impl ScannerConfig {
    /// Labels and speech for the return desk.
    pub fn for_return() -> Self {
        Self {
            success_action_label: "반납 완료".to_string(),
            invalid_action_label: "다시 시도".to_string(),
            success_speech: Some("반납되었습니다".to_string()),
            denied_speech: Some("반납이 불가합니다".to_string()),
            ..Self::default()
        }
    }

    pub fn for_rent() -> Self {
        Self {
            success_action_label: "대여 완료".to_string(),
            invalid_action_label: "다시 시도".to_string(),
            success_speech: Some("대여되었습니다".to_string()),
            denied_speech: Some("대여가 불가합니다".to_string()),
            ..Self::default()
        }
    }

    pub fn for_student_fee() -> Self {
        Self {
            success_action_label: "승인".to_string(),
            denied_action_label: "미승인".to_string(),
            invalid_action_label: "미승인".to_string(),
            success_speech: Some("확인되었습니다".to_string()),
            denied_speech: Some("학생회비 미납".to_string()),
            ..Self::default()
        }
    }
}

pub struct ReturnScanProcessor<T> {
    client: CouncilClient,
    transport: T,
}

impl<T: Transport> ReturnScanProcessor<T> {
    pub fn new(client: CouncilClient, transport: T) -> Self {
        Self { client, transport }
    }

    fn run(&self, token: &str) -> Result<(), RentalScanError> {
        let request = self.client.build_return_item_by_qr(token)?;
        match self.transport.execute(request) {
            Ok(response) => self.client.parse_return_item_by_qr(response),
            Err(err) => Err(rental_error_from_transport(&err, DEFAULT_RENTAL_ERROR_MESSAGE)),
        }
    }
}

impl<T: Transport> ScanProcessor for ReturnScanProcessor<T> {
    fn process(&mut self, token: &str) -> Result<ScanResult, ScanFailure> {
        Ok(classify_return(self.run(token)))
    }
}

pub struct RentScanProcessor<T> {
    client: CouncilClient,
    transport: T,
}

impl<T: Transport> RentScanProcessor<T> {
    pub fn new(client: CouncilClient, transport: T) -> Self {
        Self { client, transport }
    }

    fn run(&self, token: &str) -> Result<(), RentalScanError> {
        let request = self.client.build_rent_item_by_qr(token)?;
        match self.transport.execute(request) {
            Ok(response) => self.client.parse_rent_item_by_qr(response),
            Err(err) => Err(rental_error_from_transport(&err, DEFAULT_RENTAL_ERROR_MESSAGE)),
        }
    }
}

impl<T: Transport> ScanProcessor for RentScanProcessor<T> {
    fn process(&mut self, token: &str) -> Result<ScanResult, ScanFailure> {
        Ok(classify_rent(self.run(token)))
    }
}

pub struct StudentFeeScanProcessor<T> {
    client: CouncilClient,
    transport: T,
}

impl<T: Transport> StudentFeeScanProcessor<T> {
    pub fn new(client: CouncilClient, transport: T) -> Self {
        Self { client, transport }
    }

    fn run(&self, token: &str) -> Result<bool, ApiError> {
        let request = self.client.build_verify_student_fee(token)?;
        let response = self.transport.execute(request)?;
        self.client.parse_verify_student_fee(response)
    }
}

impl<T: Transport> ScanProcessor for StudentFeeScanProcessor<T> {
    fn process(&mut self, token: &str) -> Result<ScanResult, ScanFailure> {
        Ok(classify_student_fee(self.run(token)))
    }
}

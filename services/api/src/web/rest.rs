//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::web::{auth, callables, codes, companies, entries, progress, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::code_login_handler,
        auth::logout_handler,
        auth::me_handler,
        callables::create_trainer_handler,
        callables::create_apprentice_handler,
        callables::delete_user_handler,
        companies::list_companies_handler,
        companies::create_company_handler,
        companies::update_company_handler,
        companies::delete_company_handler,
        users::list_users_handler,
        users::trainer_apprentices_handler,
        codes::list_codes_handler,
        codes::issue_code_handler,
        codes::revoke_code_handler,
        entries::list_entries_handler,
        entries::submit_entry_handler,
        entries::delete_entry_handler,
        entries::set_note_handler,
        progress::statistics_handler,
        progress::report_handler,
    ),
    components(
        schemas(
            ErrorBody,
            auth::LoginRequest,
            auth::CodeLoginRequest,
            auth::ProfileResponse,
            auth::CodeLoginResponse,
            callables::CreateTrainerRequest,
            callables::CreateApprenticeRequest,
            callables::DeleteUserRequest,
            callables::AccountCreatedResponse,
            callables::SuccessResponse,
            companies::CompanyRequest,
            codes::IssueCodeRequest,
            entries::NoteRequest,
        )
    ),
    tags(
        (name = "auth", description = "Sign-in with email or join code."),
        (name = "functions", description = "Admin callables for account provisioning."),
        (name = "directory", description = "Companies and users."),
        (name = "codes", description = "Join codes for apprentice self-registration."),
        (name = "entries", description = "Daily work-log entries and trainer review."),
        (name = "progress", description = "Statistics and the PDF progress report.")
    )
)]
pub struct ApiDoc;

pub mod accounts;
pub mod recipes;

pub use accounts::{
    AccountService, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
pub use recipes::{RecipePage, RecipeService, CATEGORY_PAGE_SIZE};

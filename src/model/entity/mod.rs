mod user;
pub use user::{BillingAddress, UserEntity, UserEntityCreate, UserEntityUpdate};

mod module;
pub use module::{Module, ModuleCreate, ModuleUpdate, ModuleWithLessonsRow};

mod lesson;
pub use lesson::{
    Lesson, LessonCreate, LessonResource, LessonUpdate, VIDEO_STATUS_PREPARING, VIDEO_STATUS_READY,
};

mod ordering;
pub use ordering::{LessonOrder, ModuleOrder, validate_lesson_orders, validate_module_orders};

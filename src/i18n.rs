use kinoclub_core::Language;

/// Translation function - returns localized string based on language
pub fn t(key: &str, lang: Language) -> String {
    match (key, lang) {
        // Navigation
        ("home", Language::English) => "Home",
        ("home", Language::Russian) => "Главная",
        ("movies", Language::English) => "Movies",
        ("movies", Language::Russian) => "Фильмы",
        ("users", Language::English) => "Users",
        ("users", Language::Russian) => "Пользователи",
        ("add_movie", Language::English) => "➕ Add movie",
        ("add_movie", Language::Russian) => "➕ Добавить фильм",
        ("back", Language::English) => "Back",
        ("back", Language::Russian) => "Назад",
        ("login", Language::English) => "Log in",
        ("login", Language::Russian) => "Войти",
        ("logout", Language::English) => "Log out",
        ("logout", Language::Russian) => "Выйти",
        ("register", Language::English) => "Sign up",
        ("register", Language::Russian) => "Регистрация",
        ("forbidden_page", Language::English) => "⛔ Only moderators and admins can manage movies",
        ("forbidden_page", Language::Russian) => "⛔ Управлять фильмами могут только модераторы и администраторы",

        // Common
        ("loading", Language::English) => "Loading…",
        ("loading", Language::Russian) => "Загрузка…",
        ("retry", Language::English) => "⟳ Retry",
        ("retry", Language::Russian) => "⟳ Повторить",
        ("refresh", Language::English) => "Refresh",
        ("refresh", Language::Russian) => "Обновить",
        ("save", Language::English) => "💾 Save",
        ("save", Language::Russian) => "💾 Сохранить",
        ("saving", Language::English) => "Saving…",
        ("saving", Language::Russian) => "Сохранение…",
        ("cancel", Language::English) => "❌ Cancel",
        ("cancel", Language::Russian) => "❌ Отмена",
        ("confirm", Language::English) => "✔ Confirm",
        ("confirm", Language::Russian) => "✔ Подтвердить",
        ("edit", Language::English) => "✏ Edit",
        ("edit", Language::Russian) => "✏ Изменить",
        ("delete", Language::English) => "🗑 Delete",
        ("delete", Language::Russian) => "🗑 Удалить",
        ("clear", Language::English) => "Clear",
        ("clear", Language::Russian) => "Сбросить",
        ("copied", Language::English) => "✅ Copied to clipboard",
        ("copied", Language::Russian) => "✅ Скопировано в буфер обмена",
        ("clipboard_unavailable", Language::English) => "Clipboard not available",
        ("clipboard_unavailable", Language::Russian) => "Буфер обмена недоступен",
        ("images", Language::English) => "Images",
        ("images", Language::Russian) => "Изображения",
        ("choose_file", Language::English) => "📂 Choose file",
        ("choose_file", Language::Russian) => "📂 Выбрать файл",
        ("no_file", Language::English) => "No file chosen",
        ("no_file", Language::Russian) => "Файл не выбран",
        ("page", Language::English) => "Page",
        ("page", Language::Russian) => "Страница",
        ("months", Language::English) => "mo.",
        ("months", Language::Russian) => "мес.",

        // Home
        ("home_title", Language::English) => "Welcome to KinoClub",
        ("home_title", Language::Russian) => "Добро пожаловать в KinoClub",
        ("home_subtitle", Language::English) => "Movies, series and people who love them",
        ("home_subtitle", Language::Russian) => "Фильмы, сериалы и люди, которые их любят",
        ("hot_now", Language::English) => "🔥 Top rated",
        ("hot_now", Language::Russian) => "🔥 Лучшие по рейтингу",
        ("all_movies", Language::English) => "All movies →",
        ("all_movies", Language::Russian) => "Все фильмы →",
        ("top_users", Language::English) => "🏆 Top users",
        ("top_users", Language::Russian) => "🏆 Лучшие пользователи",
        ("no_movies", Language::English) => "No movies yet",
        ("no_movies", Language::Russian) => "Фильмов пока нет",
        ("no_users", Language::English) => "No users",
        ("no_users", Language::Russian) => "Пользователей нет",

        // Catalog
        ("catalog_requires_login", Language::English) => "Log in to see the catalog",
        ("catalog_requires_login", Language::Russian) => "Войдите, чтобы увидеть каталог",
        ("movies_found", Language::English) => "Movies found",
        ("movies_found", Language::Russian) => "Найдено фильмов",
        ("no_movies_match", Language::English) => "No movies match the filters",
        ("no_movies_match", Language::Russian) => "Нет фильмов, подходящих под фильтры",
        ("filters", Language::English) => "🔎 Filters",
        ("filters", Language::Russian) => "🔎 Фильтры",
        ("genres", Language::English) => "Genres",
        ("genres", Language::Russian) => "Жанры",
        ("min_rating", Language::English) => "Min rating",
        ("min_rating", Language::Russian) => "Рейтинг от",
        ("years", Language::English) => "Years",
        ("years", Language::Russian) => "Годы",
        ("sort_by", Language::English) => "Sort by",
        ("sort_by", Language::Russian) => "Сортировка",
        ("sort_rating_desc", Language::English) => "Rating ↓",
        ("sort_rating_desc", Language::Russian) => "Рейтинг ↓",
        ("sort_rating_asc", Language::English) => "Rating ↑",
        ("sort_rating_asc", Language::Russian) => "Рейтинг ↑",
        ("sort_year_desc", Language::English) => "Newest first",
        ("sort_year_desc", Language::Russian) => "Сначала новые",
        ("sort_year_asc", Language::English) => "Oldest first",
        ("sort_year_asc", Language::Russian) => "Сначала старые",
        ("sort_title_asc", Language::English) => "Title A–Z",
        ("sort_title_asc", Language::Russian) => "Название А–Я",
        ("sort_title_desc", Language::English) => "Title Z–A",
        ("sort_title_desc", Language::Russian) => "Название Я–А",
        ("reset_filters", Language::English) => "Reset filters",
        ("reset_filters", Language::Russian) => "Сбросить фильтры",

        // Movie details
        ("director", Language::English) => "Director",
        ("director", Language::Russian) => "Режиссёр",
        ("trailer", Language::English) => "Trailer",
        ("trailer", Language::Russian) => "Трейлер",
        ("copy_link", Language::English) => "📋 Copy link",
        ("copy_link", Language::Russian) => "📋 Копировать ссылку",
        ("browser_failed", Language::English) => "Cannot open browser",
        ("browser_failed", Language::Russian) => "Не удалось открыть браузер",
        ("episodes", Language::English) => "Episodes",
        ("episodes", Language::Russian) => "Серии",
        ("episode", Language::English) => "Episode",
        ("episode", Language::Russian) => "Серия",
        ("no_episodes", Language::English) => "No episodes yet",
        ("no_episodes", Language::Russian) => "Серий пока нет",
        ("free", Language::English) => "Free",
        ("free", Language::Russian) => "Бесплатно",
        ("watch", Language::English) => "▶ Watch",
        ("watch", Language::Russian) => "▶ Смотреть",
        ("buy", Language::English) => "Buy",
        ("buy", Language::Russian) => "Купить",
        ("login_to_watch", Language::English) => "🔐 Log in to watch",
        ("login_to_watch", Language::Russian) => "🔐 Войдите, чтобы смотреть",
        ("not_enough_coins", Language::English) => "Not enough coins",
        ("not_enough_coins", Language::Russian) => "Недостаточно монет",
        ("no_video_file", Language::English) => "This episode has no video yet",
        ("no_video_file", Language::Russian) => "У этой серии пока нет видео",
        ("player_failed", Language::English) => "Cannot start the player",
        ("player_failed", Language::Russian) => "Не удалось запустить плеер",

        // Comments
        ("comments", Language::English) => "Comments",
        ("comments", Language::Russian) => "Комментарии",
        ("no_comments", Language::English) => "No comments yet. Be the first!",
        ("no_comments", Language::Russian) => "Комментариев пока нет. Будьте первым!",
        ("comment_hint", Language::English) => "Share your thoughts…",
        ("comment_hint", Language::Russian) => "Поделитесь впечатлениями…",
        ("reply_hint", Language::English) => "Your reply…",
        ("reply_hint", Language::Russian) => "Ваш ответ…",
        ("your_rating", Language::English) => "Your rating",
        ("your_rating", Language::Russian) => "Ваша оценка",
        ("post_comment", Language::English) => "Post",
        ("post_comment", Language::Russian) => "Отправить",
        ("send", Language::English) => "Send",
        ("send", Language::Russian) => "Отправить",
        ("reply", Language::English) => "↩ Reply",
        ("reply", Language::Russian) => "↩ Ответить",
        ("login_to_comment", Language::English) => "Log in to leave a comment",
        ("login_to_comment", Language::Russian) => "Войдите, чтобы оставить комментарий",

        // Confirmations
        ("confirm_purchase", Language::English) => "Confirm purchase",
        ("confirm_purchase", Language::Russian) => "Подтверждение покупки",
        ("confirm_delete", Language::English) => "Confirm deletion",
        ("confirm_delete", Language::Russian) => "Подтверждение удаления",
        ("buy_episode_question", Language::English) => "Buy episode",
        ("buy_episode_question", Language::Russian) => "Купить серию",
        ("buy_premium_question", Language::English) => "Buy premium for",
        ("buy_premium_question", Language::Russian) => "Купить премиум на",
        ("delete_movie_question", Language::English) => "Delete the movie",
        ("delete_movie_question", Language::Russian) => "Удалить фильм",
        ("delete_comment_question", Language::English) => "Delete this comment?",
        ("delete_comment_question", Language::Russian) => "Удалить этот комментарий?",

        // Mutation results
        ("episode_purchased", Language::English) => "✅ Episode purchased",
        ("episode_purchased", Language::Russian) => "✅ Серия куплена",
        ("premium_activated", Language::English) => "👑 Premium activated",
        ("premium_activated", Language::Russian) => "👑 Премиум активирован",
        ("movie_deleted", Language::English) => "Movie deleted",
        ("movie_deleted", Language::Russian) => "Фильм удалён",
        ("movie_created", Language::English) => "✅ Movie created",
        ("movie_created", Language::Russian) => "✅ Фильм создан",
        ("movie_saved", Language::English) => "✅ Movie saved",
        ("movie_saved", Language::Russian) => "✅ Фильм сохранён",
        ("comment_posted", Language::English) => "Comment posted",
        ("comment_posted", Language::Russian) => "Комментарий опубликован",
        ("comment_updated", Language::English) => "Comment updated",
        ("comment_updated", Language::Russian) => "Комментарий обновлён",
        ("comment_deleted", Language::English) => "Comment deleted",
        ("comment_deleted", Language::Russian) => "Комментарий удалён",
        ("profile_updated", Language::English) => "✅ Profile updated",
        ("profile_updated", Language::Russian) => "✅ Профиль обновлён",
        ("photo_uploaded", Language::English) => "✅ Image uploaded",
        ("photo_uploaded", Language::Russian) => "✅ Изображение загружено",

        // Auth
        ("login_title", Language::English) => "Log in to KinoClub",
        ("login_title", Language::Russian) => "Вход в KinoClub",
        ("register_title", Language::English) => "Create an account",
        ("register_title", Language::Russian) => "Создание аккаунта",
        ("email", Language::English) => "Email",
        ("email", Language::Russian) => "Эл. почта",
        ("password", Language::English) => "Password",
        ("password", Language::Russian) => "Пароль",
        ("confirm_password", Language::English) => "Repeat password",
        ("confirm_password", Language::Russian) => "Повторите пароль",
        ("first_name", Language::English) => "First name",
        ("first_name", Language::Russian) => "Имя",
        ("last_name", Language::English) => "Last name",
        ("last_name", Language::Russian) => "Фамилия",
        ("username", Language::English) => "Username",
        ("username", Language::Russian) => "Имя пользователя",
        ("login_google", Language::English) => "Continue with Google",
        ("login_google", Language::Russian) => "Войти через Google",
        ("oauth_waiting", Language::English) => "Finish signing in in your browser…",
        ("oauth_waiting", Language::Russian) => "Завершите вход в браузере…",
        ("oauth_cancelled", Language::English) => "Google sign-in cancelled",
        ("oauth_cancelled", Language::Russian) => "Вход через Google отменён",
        ("fill_email_password", Language::English) => "Enter email and password",
        ("fill_email_password", Language::Russian) => "Введите почту и пароль",
        ("no_account", Language::English) => "No account yet?",
        ("no_account", Language::Russian) => "Нет аккаунта?",
        ("have_account", Language::English) => "Already registered?",
        ("have_account", Language::Russian) => "Уже есть аккаунт?",
        ("registered", Language::English) => "✅ Account created, you can log in now",
        ("registered", Language::Russian) => "✅ Аккаунт создан, теперь можно войти",
        ("welcome_back", Language::English) => "👋 Welcome!",
        ("welcome_back", Language::Russian) => "👋 Добро пожаловать!",
        ("logged_out", Language::English) => "Logged out",
        ("logged_out", Language::Russian) => "Вы вышли из аккаунта",
        ("login_required", Language::English) => "Please log in first",
        ("login_required", Language::Russian) => "Сначала войдите в аккаунт",
        ("session_expired", Language::English) => "Session expired, please log in again",
        ("session_expired", Language::Russian) => "Сессия истекла, войдите снова",

        // Profile
        ("edit_profile", Language::English) => "✏ Edit profile",
        ("edit_profile", Language::Russian) => "✏ Редактировать профиль",
        ("change_photo", Language::English) => "🖼 Change photo",
        ("change_photo", Language::Russian) => "🖼 Сменить фото",
        ("change_header", Language::English) => "🖼 Change header",
        ("change_header", Language::Russian) => "🖼 Сменить обложку",
        ("location", Language::English) => "Location",
        ("location", Language::Russian) => "Город",
        ("age", Language::English) => "Age",
        ("age", Language::Russian) => "Возраст",
        ("about", Language::English) => "About",
        ("about", Language::Russian) => "О себе",
        ("level", Language::English) => "Level",
        ("level", Language::Russian) => "Уровень",
        ("balance", Language::English) => "Balance",
        ("balance", Language::Russian) => "Баланс",
        ("member_since", Language::English) => "Member since",
        ("member_since", Language::Russian) => "С нами с",
        ("user", Language::English) => "User",
        ("user", Language::Russian) => "Пользователь",
        ("status", Language::English) => "Status",
        ("status", Language::Russian) => "Статус",
        ("role_user", Language::English) => "User",
        ("role_user", Language::Russian) => "Пользователь",
        ("role_moderator", Language::English) => "Moderator",
        ("role_moderator", Language::Russian) => "Модератор",
        ("role_admin", Language::English) => "Admin",
        ("role_admin", Language::Russian) => "Администратор",
        ("role_superadmin", Language::English) => "Super admin",
        ("role_superadmin", Language::Russian) => "Суперадмин",

        // Premium
        ("premium", Language::English) => "Premium",
        ("premium", Language::Russian) => "Премиум",
        ("premium_pitch", Language::English) => "Premium opens every episode without buying them one by one.",
        ("premium_pitch", Language::Russian) => "Премиум открывает все серии без покупки по отдельности.",
        ("premium_active", Language::English) => "Your premium is active",
        ("premium_active", Language::Russian) => "Ваш премиум активен",
        ("premium_until", Language::English) => "Premium until",
        ("premium_until", Language::Russian) => "Премиум до",
        ("buy_premium", Language::English) => "👑 Get premium",
        ("buy_premium", Language::Russian) => "👑 Оформить премиум",
        ("extend_premium", Language::English) => "👑 Extend premium",
        ("extend_premium", Language::Russian) => "👑 Продлить премиум",

        // Movie form
        ("edit_movie", Language::English) => "✏ Edit movie",
        ("edit_movie", Language::Russian) => "✏ Редактирование фильма",
        ("title", Language::English) => "Title",
        ("title", Language::Russian) => "Название",
        ("original_title", Language::English) => "Original title",
        ("original_title", Language::Russian) => "Оригинальное название",
        ("release_date", Language::English) => "Release date",
        ("release_date", Language::Russian) => "Дата выхода",
        ("duration", Language::English) => "Duration",
        ("duration", Language::Russian) => "Длительность",
        ("description", Language::English) => "Description",
        ("description", Language::Russian) => "Описание",
        ("trailer_url", Language::English) => "Trailer link",
        ("trailer_url", Language::Russian) => "Ссылка на трейлер",
        ("not_a_video_link", Language::English) => "Not a YouTube, Vimeo or Dailymotion link",
        ("not_a_video_link", Language::Russian) => "Это не ссылка YouTube, Vimeo или Dailymotion",
        ("new_genre", Language::English) => "New genre",
        ("new_genre", Language::Russian) => "Новый жанр",
        ("poster", Language::English) => "Poster",
        ("poster", Language::Russian) => "Постер",
        ("backdrop", Language::English) => "Backdrop",
        ("backdrop", Language::Russian) => "Фон",

        // Settings
        ("settings", Language::English) => "⚙️ Settings",
        ("settings", Language::Russian) => "⚙️ Настройки",
        ("api_url", Language::English) => "API address",
        ("api_url", Language::Russian) => "Адрес API",
        ("request_timeout", Language::English) => "Request timeout",
        ("request_timeout", Language::Russian) => "Таймаут запроса",
        ("oauth_timeout", Language::English) => "Browser login timeout",
        ("oauth_timeout", Language::Russian) => "Таймаут входа через браузер",
        ("oauth_port", Language::English) => "Login callback port (0 = any)",
        ("oauth_port", Language::Russian) => "Порт для входа (0 = любой)",
        ("player_command", Language::English) => "Player command",
        ("player_command", Language::Russian) => "Команда плеера",
        ("theme", Language::English) => "Theme",
        ("theme", Language::Russian) => "Тема",
        ("theme_dark", Language::English) => "Dark",
        ("theme_dark", Language::Russian) => "Тёмная",
        ("theme_light", Language::English) => "Light",
        ("theme_light", Language::Russian) => "Светлая",
        ("font_scale", Language::English) => "Font Scale",
        ("font_scale", Language::Russian) => "Размер шрифта",
        ("language", Language::English) => "Language",
        ("language", Language::Russian) => "Язык",
        ("env_override_active", Language::English) => "is set and overrides the API address",
        ("env_override_active", Language::Russian) => "задана и переопределяет адрес API",
        ("settings_saved", Language::English) => "✅ Settings saved",
        ("settings_saved", Language::Russian) => "✅ Настройки сохранены",
        ("settings_not_saved", Language::English) => "Cannot save settings",
        ("settings_not_saved", Language::Russian) => "Не удалось сохранить настройки",

        // Fallback
        _ => key,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinoclub_core::SortKey;

    #[test]
    fn sort_labels_are_translated() {
        for key in SortKey::ALL {
            for lang in [Language::English, Language::Russian] {
                assert_ne!(t(key.label_key(), lang), key.label_key());
            }
        }
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(t("no_such_key", Language::Russian), "no_such_key");
        assert_eq!(t("movies", Language::Russian), "Фильмы");
    }
}

//! HTML pages

use axum::response::Html;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Stash</title>
</head>
<body>
  <h1>Stash</h1>
  <form id="upload">
    <input type="file" name="file" required>
    <button type="submit">Upload</button>
  </form>
  <button id="logout">Log out</button>
  <ul id="objects"></ul>
  <script>
    async function refresh() {
      const res = await fetch('/api/list');
      const body = await res.json();
      const list = document.getElementById('objects');
      list.replaceChildren();
      for (const obj of body.objects || []) {
        const item = document.createElement('li');
        const link = document.createElement('a');
        link.href = '/api/download/' + encodeURIComponent(obj.name);
        link.textContent = obj.original_name + ' (' + obj.size + ' bytes)';
        item.appendChild(link);
        list.appendChild(item);
      }
    }
    document.getElementById('upload').addEventListener('submit', async (e) => {
      e.preventDefault();
      await fetch('/api/upload', { method: 'POST', body: new FormData(e.target) });
      e.target.reset();
      refresh();
    });
    document.getElementById('logout').addEventListener('click', async () => {
      await fetch('/api/auth/logout', { method: 'POST' });
      window.location = '/login';
    });
    refresh();
  </script>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Stash - Log in</title>
</head>
<body>
  <h1>Log in</h1>
  <form id="login">
    <input name="username" placeholder="Username" autocomplete="username">
    <input name="password" type="password" placeholder="Password" autocomplete="current-password">
    <input name="token" type="password" placeholder="Access token">
    <button type="submit">Log in</button>
  </form>
  <p id="error"></p>
  <script>
    document.getElementById('login').addEventListener('submit', async (e) => {
      e.preventDefault();
      const body = {};
      for (const [k, v] of new FormData(e.target)) { if (v) body[k] = v; }
      const res = await fetch('/api/auth/login', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body),
      });
      if (res.ok) { window.location = '/'; return; }
      const err = await res.json().catch(() => ({ message: res.statusText }));
      document.getElementById('error').textContent = err.message;
    });
  </script>
</body>
</html>
"#;

/// GET / - Index page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /login - Login form
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

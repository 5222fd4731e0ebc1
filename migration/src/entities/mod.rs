pub mod url_pair;

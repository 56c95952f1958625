mod html_parser_tests;
mod integration_tests;

// Category scanner tests
